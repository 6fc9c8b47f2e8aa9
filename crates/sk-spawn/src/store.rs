//! Persistence of area definitions.
//!
//! The orchestrator rewrites the whole store on every mutation and reads
//! it back on reload. [`JsonFileStore`] is the on-disk format;
//! [`MemoryStore`] backs tests and embedders that persist elsewhere.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sk_core::{AreaDefinition, BlockPos, CoreResult, Region, TypeId, WorldId};
use tracing::{debug, warn};

use crate::error::SpawnResult;

/// Persisted areas keyed by name.
pub type StoredAreas = BTreeMap<String, StoredArea>;

/// Where the orchestrator persists its area definitions.
pub trait AreaStore: fmt::Debug {
    /// Read every stored area.
    fn load(&self) -> SpawnResult<StoredAreas>;

    /// Replace the stored areas with `areas`.
    fn save(&mut self, areas: &StoredAreas) -> SpawnResult<()>;
}

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Region as persisted: a world and two raw corners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRegion {
    /// World the region lies in.
    pub world: WorldId,
    /// First corner, x.
    pub x1: i32,
    /// First corner, y.
    pub y1: i32,
    /// First corner, z.
    pub z1: i32,
    /// Second corner, x.
    pub x2: i32,
    /// Second corner, y.
    pub y2: i32,
    /// Second corner, z.
    pub z2: i32,
}

impl From<&Region> for StoredRegion {
    fn from(region: &Region) -> Self {
        let (a, b) = (region.corner_a(), region.corner_b());
        Self {
            world: region.world().clone(),
            x1: a.x,
            y1: a.y,
            z1: a.z,
            x2: b.x,
            y2: b.y,
            z2: b.z,
        }
    }
}

impl From<StoredRegion> for Region {
    fn from(stored: StoredRegion) -> Self {
        Region::new(
            stored.world,
            BlockPos::new(stored.x1, stored.y1, stored.z1),
            BlockPos::new(stored.x2, stored.y2, stored.z2),
        )
    }
}

fn default_cap() -> u32 {
    20
}

fn default_spawn_interval() -> u32 {
    100
}

fn default_check_interval() -> u32 {
    sk_core::DEFAULT_CHECK_INTERVAL
}

/// One area as persisted. Missing optional fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArea {
    /// Region corners.
    pub region: StoredRegion,
    /// Types the area spawns.
    pub allowed_types: Vec<TypeId>,
    /// Maximum tracked entities. Defaults to 20.
    #[serde(default = "default_cap")]
    pub population_cap: u32,
    /// Ticks between spawn attempts. Defaults to 100.
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval: u32,
    /// Ticks between containment checks. Defaults to 20.
    #[serde(default = "default_check_interval")]
    pub check_interval: u32,
    /// Start on load. Defaults to false.
    #[serde(default)]
    pub auto_start: bool,
}

impl From<&AreaDefinition> for StoredArea {
    fn from(def: &AreaDefinition) -> Self {
        Self {
            region: StoredRegion::from(def.region()),
            allowed_types: def.allowed_types().to_vec(),
            population_cap: def.population_cap(),
            spawn_interval: def.spawn_interval(),
            check_interval: def.check_interval(),
            auto_start: def.auto_start(),
        }
    }
}

impl StoredArea {
    /// Validate into a live definition named `name`.
    pub fn into_definition(self, name: &str) -> CoreResult<AreaDefinition> {
        Ok(AreaDefinition::new(
            name,
            self.region.into(),
            self.allowed_types,
            self.population_cap,
            self.spawn_interval,
        )?
        .with_check_interval(self.check_interval)?
        .with_auto_start(self.auto_start))
    }
}

#[derive(Debug, Serialize)]
struct StoreFile<'a> {
    saved_at: DateTime<Utc>,
    areas: &'a StoredAreas,
}

#[derive(Debug, Deserialize)]
struct RawStoreFile {
    #[serde(default)]
    areas: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// JSON document on disk: `{ "saved_at": ..., "areas": { name: area } }`.
///
/// A missing file reads as empty. Entries that do not parse are skipped with
/// a warning so one bad area cannot hide the rest.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// A store backed by the file at `path`. Nothing is read until `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl AreaStore for JsonFileStore {
    fn load(&self) -> SpawnResult<StoredAreas> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "store file missing; starting empty");
            return Ok(StoredAreas::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        let raw: RawStoreFile = serde_json::from_str(&text)?;

        let mut areas = StoredAreas::new();
        for (name, value) in raw.areas {
            match serde_json::from_value::<StoredArea>(value) {
                Ok(area) => {
                    areas.insert(name, area);
                }
                Err(err) => warn!(area = %name, error = %err, "skipping malformed stored area"),
            }
        }
        Ok(areas)
    }

    fn save(&mut self, areas: &StoredAreas) -> SpawnResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = StoreFile {
            saved_at: Utc::now(),
            areas,
        };
        let json = serde_json::to_string_pretty(&file)?;
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        debug!(path = %self.path.display(), areas = areas.len(), "store written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    areas: StoredAreas,
    saves: usize,
    failing: bool,
}

/// In-memory store. Clones share the same contents, so a caller can keep a
/// handle after giving one to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `areas`.
    pub fn with_areas(areas: StoredAreas) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().areas = areas;
        store
    }

    /// Current contents.
    pub fn snapshot(&self) -> StoredAreas {
        self.inner.borrow().areas.clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.inner.borrow().saves
    }

    /// Make every following save fail with an I/O error.
    pub fn set_failing(&self, failing: bool) {
        self.inner.borrow_mut().failing = failing;
    }

    /// Overwrite the contents without counting a save.
    pub fn replace(&self, areas: StoredAreas) {
        self.inner.borrow_mut().areas = areas;
    }
}

impl AreaStore for MemoryStore {
    fn load(&self) -> SpawnResult<StoredAreas> {
        Ok(self.inner.borrow().areas.clone())
    }

    fn save(&mut self, areas: &StoredAreas) -> SpawnResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing {
            return Err(std::io::Error::other("memory store is read-only").into());
        }
        inner.areas = areas.clone();
        inner.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm() -> AreaDefinition {
        AreaDefinition::new(
            "farm",
            Region::new("w", BlockPos::new(10, 64, 0), BlockPos::new(0, 64, 10)),
            vec![TypeId::new("COW"), TypeId::new("PIG")],
            3,
            5,
        )
        .unwrap()
        .with_auto_start(true)
    }

    #[test]
    fn stored_region_keeps_raw_corners() {
        let stored = StoredRegion::from(farm().region());
        assert_eq!((stored.x1, stored.x2), (10, 0));
        let region: Region = stored.into();
        assert_eq!(region, *farm().region());
    }

    #[test]
    fn definition_survives_storage() {
        let stored = StoredArea::from(&farm());
        let def = stored.into_definition("farm").unwrap();
        assert_eq!(def, farm());
    }

    #[test]
    fn invalid_stored_area_is_rejected() {
        let mut stored = StoredArea::from(&farm());
        stored.population_cap = 0;
        assert!(stored.into_definition("farm").is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{
            "region": { "world": "w", "x1": 0, "y1": 0, "z1": 0, "x2": 1, "y2": 1, "z2": 1 },
            "allowed_types": ["COW"]
        }"#;
        let stored: StoredArea = serde_json::from_str(json).unwrap();
        assert_eq!(stored.population_cap, 20);
        assert_eq!(stored.spawn_interval, 100);
        assert_eq!(stored.check_interval, 20);
        assert!(!stored.auto_start);
    }

    #[test]
    fn json_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("areas.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn json_store_writes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("areas.json");
        let mut store = JsonFileStore::new(&path);
        let mut areas = StoredAreas::new();
        areas.insert("farm".into(), StoredArea::from(&farm()));
        store.save(&areas).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("saved_at"));
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().unwrap(), areas);
    }

    #[test]
    fn json_store_skips_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("areas.json");
        std::fs::write(
            &path,
            r#"{ "areas": {
                "good": { "region": { "world": "w", "x1": 0, "y1": 0, "z1": 0, "x2": 1, "y2": 1, "z2": 1 },
                          "allowed_types": ["COW"] },
                "bad": { "region": "nowhere" }
            } }"#,
        )
        .unwrap();
        let areas = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(areas.keys().collect::<Vec<_>>(), vec!["good"]);
    }

    #[test]
    fn json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("areas.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, crate::error::SpawnError::Json(_)));
    }

    #[test]
    fn memory_store_clones_share_contents() {
        let store = MemoryStore::new();
        let mut handle: Box<dyn AreaStore> = Box::new(store.clone());
        let mut areas = StoredAreas::new();
        areas.insert("farm".into(), StoredArea::from(&farm()));
        handle.save(&areas).unwrap();
        assert_eq!(store.saves(), 1);
        assert_eq!(store.snapshot(), areas);

        store.set_failing(true);
        assert!(handle.save(&StoredAreas::new()).is_err());
        assert_eq!(store.snapshot(), areas);
    }
}
