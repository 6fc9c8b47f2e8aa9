use std::path::Path;

use sk_core::TypeRegistry;
use sk_spawn::{SpawnConfig, SpawnError};

pub fn run(store: &Path, name: &str, config: &SpawnConfig) -> Result<(), String> {
    let mut sb = super::open_sandbox(store, TypeRegistry::new(), super::editing_config(config))?;

    sb.with_context(|orch, ctx| orch.try_remove_area(name, ctx))
        .map_err(|e| match e {
            SpawnError::UnknownArea(_) => format!("no area named '{name}'"),
            other => other.to_string(),
        })?;
    sb.orchestrator_mut()
        .save()
        .map_err(|e| format!("cannot write store {}: {e}", store.display()))?;

    println!("  Removed area '{name}'.");
    Ok(())
}
