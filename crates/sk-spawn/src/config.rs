use std::path::Path;

use serde::Deserialize;
use sk_core::DEFAULT_CHECK_INTERVAL;

use crate::error::SpawnResult;

/// Configuration for a spawn engine run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// RNG seed for deterministic spawning and loot.
    pub seed: u64,
    /// Check interval given to areas created without one.
    pub default_check_interval: u32,
    /// Ticks between registry sweeps for dead entities. 0 disables the sweep.
    pub registry_sweep_interval: u32,
    /// Start areas flagged auto-start when they are loaded.
    pub auto_start_on_load: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            default_check_interval: DEFAULT_CHECK_INTERVAL,
            registry_sweep_interval: 1200,
            auto_start_on_load: true,
        }
    }
}

impl SpawnConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> SpawnResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the check interval for newly created areas.
    pub fn with_default_check_interval(mut self, ticks: u32) -> Self {
        self.default_check_interval = ticks;
        self
    }

    /// Set the registry sweep period (0 = never).
    pub fn with_registry_sweep_interval(mut self, ticks: u32) -> Self {
        self.registry_sweep_interval = ticks;
        self
    }

    /// Set whether auto-start areas start on load.
    pub fn with_auto_start_on_load(mut self, enabled: bool) -> Self {
        self.auto_start_on_load = enabled;
        self
    }
}
