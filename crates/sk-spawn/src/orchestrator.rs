use std::collections::BTreeMap;

use serde::Serialize;
use sk_core::{
    AreaDefinition, Region, ScheduledTask, TaskRef, TaskScheduler, TypeId, TypeRegistry,
};
use tracing::{debug, error, info, warn};

use crate::config::SpawnConfig;
use crate::context::SpawnContext;
use crate::error::{SpawnError, SpawnResult};
use crate::scheduler::SpawnScheduler;
use crate::store::{AreaStore, StoredArea, StoredAreas};

#[derive(Debug)]
struct ManagedArea {
    definition: AreaDefinition,
    scheduler: SpawnScheduler,
}

impl ManagedArea {
    fn new(definition: AreaDefinition) -> Self {
        let scheduler = SpawnScheduler::new(&definition);
        Self {
            definition,
            scheduler,
        }
    }
}

/// Point-in-time summary of one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaStatus {
    /// Area name.
    pub name: String,
    /// Current region.
    pub region: Region,
    /// Types the area spawns.
    pub allowed_types: Vec<TypeId>,
    /// Whether the spawn and check tasks are scheduled.
    pub active: bool,
    /// Entities the area currently tracks.
    pub tracked: usize,
    /// Maximum tracked entities.
    pub population_cap: u32,
    /// Ticks between spawn attempts.
    pub spawn_interval: u32,
    /// Ticks between containment checks.
    pub check_interval: u32,
    /// Whether the area starts when the store is loaded.
    pub auto_start: bool,
}

/// Owns every spawn area by name and keeps the store in sync with them.
///
/// Each mutation of a definition rewrites the whole store. A failed write is
/// logged and leaves the in-memory state authoritative; [`reload_areas`]
/// restores the store's view.
///
/// [`reload_areas`]: AreaOrchestrator::reload_areas
#[derive(Debug)]
pub struct AreaOrchestrator {
    areas: BTreeMap<String, ManagedArea>,
    store: Box<dyn AreaStore>,
    config: SpawnConfig,
    sweep_task: Option<TaskRef>,
}

impl AreaOrchestrator {
    /// An orchestrator with no areas. Nothing is read from the store.
    pub fn new(store: Box<dyn AreaStore>, config: SpawnConfig) -> Self {
        Self {
            areas: BTreeMap::new(),
            store,
            config,
            sweep_task: None,
        }
    }

    /// Create an orchestrator and load every area from the store.
    pub fn open(
        store: Box<dyn AreaStore>,
        config: SpawnConfig,
        ctx: &mut SpawnContext<'_>,
    ) -> SpawnResult<Self> {
        let mut orchestrator = Self::new(store, config);
        orchestrator.load_from_store(ctx)?;
        Ok(orchestrator)
    }

    /// Engine configuration.
    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Backing store.
    pub fn store(&self) -> &dyn AreaStore {
        self.store.as_ref()
    }

    // -----------------------------------------------------------------------
    // Area lifecycle
    // -----------------------------------------------------------------------

    /// Create and persist an inactive area. Returns false if the name is
    /// taken or the configuration is invalid.
    pub fn create_area(
        &mut self,
        name: &str,
        region: Region,
        allowed_types: Vec<TypeId>,
        population_cap: u32,
        spawn_interval: u32,
        registry: &TypeRegistry,
    ) -> bool {
        match self.try_create_area(
            name,
            region,
            allowed_types,
            population_cap,
            spawn_interval,
            registry,
        ) {
            Ok(()) => true,
            Err(err) => {
                warn!(area = %name, error = %err, "area not created");
                false
            }
        }
    }

    /// Like [`create_area`](Self::create_area), reporting why it failed.
    pub fn try_create_area(
        &mut self,
        name: &str,
        region: Region,
        allowed_types: Vec<TypeId>,
        population_cap: u32,
        spawn_interval: u32,
        registry: &TypeRegistry,
    ) -> SpawnResult<()> {
        if self.areas.contains_key(name) {
            return Err(SpawnError::DuplicateArea(name.to_string()));
        }
        let definition =
            AreaDefinition::new(name, region, allowed_types, population_cap, spawn_interval)?
                .with_check_interval(self.config.default_check_interval)?;
        self.insert_area(definition, registry)?;
        self.persist();
        Ok(())
    }

    /// Add a fully built, inactive area and write the store once.
    ///
    /// A failed write is returned, but the area stays in memory.
    pub fn try_add_area(
        &mut self,
        definition: AreaDefinition,
        registry: &TypeRegistry,
    ) -> SpawnResult<()> {
        self.insert_area(definition, registry)?;
        self.save()
    }

    fn insert_area(
        &mut self,
        definition: AreaDefinition,
        registry: &TypeRegistry,
    ) -> SpawnResult<()> {
        let name = definition.name().to_string();
        if self.areas.contains_key(&name) {
            return Err(SpawnError::DuplicateArea(name));
        }
        registry.validate_spawn_types(definition.allowed_types())?;
        info!(area = %name, region = %definition.region(), "spawn area created");
        self.areas.insert(name, ManagedArea::new(definition));
        Ok(())
    }

    /// Shut down an area, removing its entities, and forget it.
    pub fn remove_area(&mut self, name: &str, ctx: &mut SpawnContext<'_>) -> bool {
        self.try_remove_area(name, ctx).is_ok()
    }

    /// Like [`remove_area`](Self::remove_area), returning how many entities
    /// were despawned.
    pub fn try_remove_area(
        &mut self,
        name: &str,
        ctx: &mut SpawnContext<'_>,
    ) -> SpawnResult<usize> {
        let mut area = self
            .areas
            .remove(name)
            .ok_or_else(|| SpawnError::UnknownArea(name.to_string()))?;
        let removed = area.scheduler.shutdown(ctx);
        info!(area = %name, removed, "spawn area removed");
        self.persist();
        Ok(removed)
    }

    /// Start an area. False if unknown or it has no region.
    pub fn start_area(&mut self, name: &str, tasks: &mut dyn TaskScheduler) -> bool {
        match self.areas.get_mut(name) {
            Some(area) => area.scheduler.start(tasks),
            None => false,
        }
    }

    /// Stop an area. True if the area exists, whatever its previous state.
    pub fn stop_area(&mut self, name: &str, tasks: &mut dyn TaskScheduler) -> bool {
        match self.areas.get_mut(name) {
            Some(area) => {
                area.scheduler.stop(tasks);
                true
            }
            None => false,
        }
    }

    /// Stop an active area or start an inactive one.
    ///
    /// Returns false if the area is unknown or fails to start.
    pub fn toggle_area(&mut self, name: &str, tasks: &mut dyn TaskScheduler) -> bool {
        let Some(area) = self.areas.get_mut(name) else {
            return false;
        };
        if area.scheduler.is_active() {
            area.scheduler.stop(tasks);
            true
        } else {
            area.scheduler.start(tasks)
        }
    }

    /// Restart an active area. False if unknown or inactive.
    pub fn restart_area(&mut self, name: &str, tasks: &mut dyn TaskScheduler) -> bool {
        match self.areas.get_mut(name) {
            Some(area) => area.scheduler.restart(tasks),
            None => false,
        }
    }

    /// Start every area. Returns how many are active afterwards.
    pub fn start_all(&mut self, tasks: &mut dyn TaskScheduler) -> usize {
        let mut started = 0;
        for (name, area) in &mut self.areas {
            if area.scheduler.start(tasks) {
                started += 1;
            } else {
                warn!(area = %name, "area failed to start");
            }
        }
        info!(started, total = self.areas.len(), "started all spawn areas");
        started
    }

    /// Stop every area.
    pub fn stop_all(&mut self, tasks: &mut dyn TaskScheduler) {
        for area in self.areas.values_mut() {
            area.scheduler.stop(tasks);
        }
        info!(total = self.areas.len(), "stopped all spawn areas");
    }

    /// Remove every tracked entity of one area. The area keeps running.
    pub fn clear_area(&mut self, name: &str, ctx: &mut SpawnContext<'_>) -> usize {
        match self.areas.get_mut(name) {
            Some(area) => area.scheduler.clear_all(ctx),
            None => 0,
        }
    }

    /// Remove every tracked entity of every area.
    pub fn clear_all(&mut self, ctx: &mut SpawnContext<'_>) -> usize {
        self.areas
            .values_mut()
            .map(|area| area.scheduler.clear_all(ctx))
            .sum()
    }

    /// Shut down every area and the registry sweep, then drop all areas
    /// from memory. The store is left untouched.
    pub fn shutdown_all(&mut self, ctx: &mut SpawnContext<'_>) -> usize {
        self.stop_maintenance(&mut *ctx.scheduler);
        let removed = self.discard_all(ctx);
        info!(removed, "all spawn areas shut down");
        removed
    }

    /// Discard every area and load the store again.
    ///
    /// Changes that were never persisted are lost. Returns the number of
    /// areas loaded.
    pub fn reload_areas(&mut self, ctx: &mut SpawnContext<'_>) -> SpawnResult<usize> {
        let removed = self.discard_all(ctx);
        debug!(removed, "discarded areas for reload");
        let loaded = self.load_from_store(ctx)?;
        info!(loaded, "spawn areas reloaded");
        Ok(loaded)
    }

    fn discard_all(&mut self, ctx: &mut SpawnContext<'_>) -> usize {
        std::mem::take(&mut self.areas)
            .into_values()
            .map(|mut area| area.scheduler.shutdown(ctx))
            .sum()
    }

    fn load_from_store(&mut self, ctx: &mut SpawnContext<'_>) -> SpawnResult<usize> {
        let stored = self.store.load()?;
        let mut loaded = 0;
        for (name, area) in stored {
            let definition = match area.into_definition(&name) {
                Ok(def) => def,
                Err(err) => {
                    warn!(area = %name, error = %err, "skipping invalid stored area");
                    continue;
                }
            };
            if let Err(err) = ctx.registry.validate_spawn_types(definition.allowed_types()) {
                warn!(area = %name, error = %err, "stored area has unresolvable types");
            }
            let auto_start = self.config.auto_start_on_load && definition.auto_start();
            let mut managed = ManagedArea::new(definition);
            if auto_start {
                managed.scheduler.start(&mut *ctx.scheduler);
            }
            self.areas.insert(name, managed);
            loaded += 1;
        }
        Ok(loaded)
    }

    // -----------------------------------------------------------------------
    // Updates
    // -----------------------------------------------------------------------

    /// Change cap and spawn interval. A running spawn task is rescheduled
    /// at the new interval; nothing else restarts.
    pub fn update_area(
        &mut self,
        name: &str,
        population_cap: u32,
        spawn_interval: u32,
        tasks: &mut dyn TaskScheduler,
    ) -> bool {
        let Some(area) = self.areas.get_mut(name) else {
            return false;
        };
        let mut definition = area.definition.clone();
        let validated = definition
            .set_population_cap(population_cap)
            .and_then(|()| definition.set_spawn_interval(spawn_interval));
        if let Err(err) = validated {
            warn!(area = %name, error = %err, "area not updated");
            return false;
        }
        area.definition = definition;
        area.scheduler.set_population_cap(population_cap);
        area.scheduler.set_spawn_interval(spawn_interval, tasks);
        debug!(area = %name, population_cap, spawn_interval, "area updated");
        self.persist();
        true
    }

    /// Replace the allowed types. Every type must resolve in `registry`.
    pub fn update_area_types(
        &mut self,
        name: &str,
        allowed_types: Vec<TypeId>,
        registry: &TypeRegistry,
    ) -> bool {
        let Some(area) = self.areas.get_mut(name) else {
            return false;
        };
        if let Err(err) = registry.validate_spawn_types(&allowed_types) {
            warn!(area = %name, error = %err, "area types not updated");
            return false;
        }
        if let Err(err) = area.definition.set_allowed_types(allowed_types) {
            warn!(area = %name, error = %err, "area types not updated");
            return false;
        }
        area.scheduler
            .set_allowed_types(area.definition.allowed_types().to_vec());
        self.persist();
        true
    }

    /// Replace the region. An active area is restarted on the new region.
    pub fn update_region(
        &mut self,
        name: &str,
        region: Region,
        tasks: &mut dyn TaskScheduler,
    ) -> bool {
        let Some(area) = self.areas.get_mut(name) else {
            return false;
        };
        area.definition.set_region(region.clone());
        area.scheduler.set_region(Some(region), tasks);
        self.persist();
        true
    }

    /// Change an area's check interval, rescheduling a running check task.
    pub fn set_check_interval(
        &mut self,
        name: &str,
        ticks: u32,
        tasks: &mut dyn TaskScheduler,
    ) -> bool {
        let Some(area) = self.areas.get_mut(name) else {
            return false;
        };
        if let Err(err) = area.definition.set_check_interval(ticks) {
            warn!(area = %name, error = %err, "check interval not updated");
            return false;
        }
        area.scheduler.set_check_interval(ticks, tasks);
        self.persist();
        true
    }

    /// Set whether an area starts on load. Persists.
    pub fn set_auto_start(&mut self, name: &str, auto_start: bool) -> bool {
        let Some(area) = self.areas.get_mut(name) else {
            return false;
        };
        area.definition.set_auto_start(auto_start);
        self.persist();
        true
    }

    // -----------------------------------------------------------------------
    // Tick dispatch
    // -----------------------------------------------------------------------

    /// Register the periodic registry sweep. False if disabled by config.
    pub fn start_maintenance(&mut self, tasks: &mut dyn TaskScheduler) -> bool {
        if self.config.registry_sweep_interval == 0 {
            return false;
        }
        self.stop_maintenance(tasks);
        self.sweep_task = Some(tasks.schedule_periodic(
            ScheduledTask::RegistrySweep,
            self.config.registry_sweep_interval,
        ));
        true
    }

    /// Cancel the registry sweep, if registered.
    pub fn stop_maintenance(&mut self, tasks: &mut dyn TaskScheduler) {
        if let Some(task) = self.sweep_task.take() {
            tasks.cancel(task);
        }
    }

    /// Route a fired host task to its area or to the registry sweep.
    ///
    /// Returns false for tasks nobody owns any more.
    pub fn dispatch(
        &mut self,
        task_ref: TaskRef,
        task: &ScheduledTask,
        ctx: &mut SpawnContext<'_>,
    ) -> bool {
        match task {
            ScheduledTask::RegistrySweep => {
                if self.sweep_task != Some(task_ref) {
                    return false;
                }
                let world = &*ctx.world;
                ctx.registry.sweep_dead(|handle| world.is_valid(handle));
                true
            }
            ScheduledTask::Spawn { area } | ScheduledTask::ContainmentCheck { area } => {
                match self.areas.get_mut(area.as_str()) {
                    Some(managed) => managed.scheduler.fire(task_ref, task, ctx),
                    None => {
                        debug!(area = %area, %task_ref, "task for unknown area");
                        false
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether an area with this name exists.
    pub fn has_area(&self, name: &str) -> bool {
        self.areas.contains_key(name)
    }

    /// Area names, sorted.
    pub fn area_names(&self) -> Vec<&str> {
        self.areas.keys().map(String::as_str).collect()
    }

    /// Names of active areas, sorted.
    pub fn active_area_names(&self) -> Vec<&str> {
        self.areas
            .iter()
            .filter(|(_, area)| area.scheduler.is_active())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Number of managed areas.
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// Number of active areas.
    pub fn active_area_count(&self) -> usize {
        self.areas
            .values()
            .filter(|area| area.scheduler.is_active())
            .count()
    }

    /// Sum of tracked entities over every area.
    pub fn total_tracked_entities(&self) -> usize {
        self.areas
            .values()
            .map(|area| area.scheduler.tracked_count())
            .sum()
    }

    /// Definition of an area.
    pub fn definition(&self, name: &str) -> Option<&AreaDefinition> {
        self.areas.get(name).map(|area| &area.definition)
    }

    /// Scheduler of an area.
    pub fn scheduler(&self, name: &str) -> Option<&SpawnScheduler> {
        self.areas.get(name).map(|area| &area.scheduler)
    }

    /// Status summary of one area.
    pub fn status(&self, name: &str) -> Option<AreaStatus> {
        self.areas.get(name).map(|area| area_status(name, area))
    }

    /// Status of every area, sorted by name.
    pub fn statuses(&self) -> Vec<AreaStatus> {
        self.areas
            .iter()
            .map(|(name, area)| area_status(name, area))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write every definition to the store.
    pub fn save(&mut self) -> SpawnResult<()> {
        let stored: StoredAreas = self
            .areas
            .iter()
            .map(|(name, area)| (name.clone(), StoredArea::from(&area.definition)))
            .collect();
        self.store.save(&stored)
    }

    fn persist(&mut self) {
        if let Err(err) = self.save() {
            error!(error = %err, "failed to persist spawn areas");
        }
    }
}

fn area_status(name: &str, area: &ManagedArea) -> AreaStatus {
    let def = &area.definition;
    AreaStatus {
        name: name.to_string(),
        region: def.region().clone(),
        allowed_types: def.allowed_types().to_vec(),
        active: area.scheduler.is_active(),
        tracked: area.scheduler.tracked_count(),
        population_cap: def.population_cap(),
        spawn_interval: def.spawn_interval(),
        check_interval: def.check_interval(),
        auto_start: def.auto_start(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{Sandbox, SandboxWorld};
    use crate::store::MemoryStore;
    use sk_core::{BlockPos, EntityKind, HostWorld, TypeDefinition};

    fn region() -> Region {
        Region::new("w", BlockPos::new(0, 64, 0), BlockPos::new(10, 64, 10))
    }

    fn cows() -> Vec<TypeId> {
        vec![TypeId::new("COW")]
    }

    fn sandbox(store: &MemoryStore) -> Sandbox {
        Sandbox::open(
            SandboxWorld::new(63),
            TypeRegistry::new(),
            Box::new(store.clone()),
            SpawnConfig::default(),
        )
        .unwrap()
    }

    fn with_farm(store: &MemoryStore) -> Sandbox {
        let mut sb = sandbox(store);
        let registry = TypeRegistry::new();
        assert!(
            sb.orchestrator_mut()
                .create_area("farm", region(), cows(), 3, 5, &registry)
        );
        sb
    }

    #[test]
    fn create_persists_and_does_not_start() {
        let store = MemoryStore::new();
        let sb = with_farm(&store);
        let orch = sb.orchestrator();
        assert!(orch.has_area("farm"));
        assert_eq!(orch.active_area_count(), 0);
        assert_eq!(store.saves(), 1);
        assert!(store.snapshot().contains_key("farm"));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        let registry = TypeRegistry::new();
        let err = sb
            .orchestrator_mut()
            .try_create_area("farm", region(), cows(), 1, 1, &registry)
            .unwrap_err();
        assert!(matches!(err, SpawnError::DuplicateArea(_)));
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn add_area_writes_the_store_once() {
        let store = MemoryStore::new();
        let mut sb = sandbox(&store);
        let registry = TypeRegistry::new();
        let def = AreaDefinition::new("farm", region(), cows(), 3, 5)
            .unwrap()
            .with_check_interval(7)
            .unwrap()
            .with_auto_start(true);
        sb.orchestrator_mut().try_add_area(def.clone(), &registry).unwrap();

        assert_eq!(store.saves(), 1);
        let stored = &store.snapshot()["farm"];
        assert_eq!(stored.check_interval, 7);
        assert!(stored.auto_start);
        assert_eq!(sb.orchestrator().active_area_count(), 0);

        let err = sb
            .orchestrator_mut()
            .try_add_area(def, &registry)
            .unwrap_err();
        assert!(matches!(err, SpawnError::DuplicateArea(_)));
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn add_area_reports_write_failure() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let mut sb = sandbox(&store);
        let def = AreaDefinition::new("farm", region(), cows(), 3, 5).unwrap();
        let err = sb
            .orchestrator_mut()
            .try_add_area(def, &TypeRegistry::new())
            .unwrap_err();
        assert!(matches!(err, SpawnError::Io(_)));
        assert!(sb.orchestrator().has_area("farm"));
    }

    #[test]
    fn restart_replaces_tasks_and_keeps_entities() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        sb.with_context(|orch, ctx| orch.start_area("farm", &mut *ctx.scheduler));
        sb.run(11);
        let before = sb.orchestrator().scheduler("farm").unwrap();
        assert_eq!(before.tracked_count(), 3);
        let (old_spawn, old_check) = (before.spawn_task().unwrap(), before.check_task().unwrap());

        assert!(sb.with_context(|orch, ctx| orch.restart_area("farm", &mut *ctx.scheduler)));
        let after = sb.orchestrator().scheduler("farm").unwrap();
        let (new_spawn, new_check) = (after.spawn_task().unwrap(), after.check_task().unwrap());
        assert!(after.is_active());
        assert_eq!(after.tracked_count(), 3);
        assert_ne!(new_spawn, old_spawn);
        assert_ne!(new_check, old_check);
        assert!(!sb.clock().is_scheduled(old_spawn));
        assert!(!sb.clock().is_scheduled(old_check));
        assert!(sb.clock().is_scheduled(new_spawn));
        assert!(sb.clock().is_scheduled(new_check));

        sb.with_context(|orch, ctx| {
            orch.stop_area("farm", &mut *ctx.scheduler);
            assert!(!orch.restart_area("farm", &mut *ctx.scheduler));
            assert!(!orch.restart_area("nope", &mut *ctx.scheduler));
        });
        assert!(!sb.orchestrator().scheduler("farm").unwrap().is_active());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let store = MemoryStore::new();
        let mut sb = sandbox(&store);
        let registry = TypeRegistry::new();
        let err = sb
            .orchestrator_mut()
            .try_create_area("farm", region(), vec![TypeId::new("dragon")], 1, 1, &registry)
            .unwrap_err();
        assert!(matches!(err, SpawnError::Core(_)));
        assert!(!sb.orchestrator().has_area("farm"));
    }

    #[test]
    fn custom_types_resolve_through_registry() {
        let store = MemoryStore::new();
        let mut sb = sandbox(&store);
        let mut registry = TypeRegistry::new();
        registry.register_type(TypeDefinition::plain("brute", EntityKind::Zombie).unwrap());
        assert!(sb.orchestrator_mut().create_area(
            "camp",
            region(),
            vec![TypeId::new("brute")],
            1,
            1,
            &registry
        ));
    }

    #[test]
    fn unknown_area_operations_return_false() {
        let store = MemoryStore::new();
        let mut sb = sandbox(&store);
        sb.with_context(|orch, ctx| {
            assert!(!orch.start_area("nope", &mut *ctx.scheduler));
            assert!(!orch.stop_area("nope", &mut *ctx.scheduler));
            assert!(!orch.toggle_area("nope", &mut *ctx.scheduler));
            assert!(!orch.update_area("nope", 1, 1, &mut *ctx.scheduler));
            assert!(!orch.remove_area("nope", ctx));
            assert!(matches!(
                orch.try_remove_area("nope", ctx),
                Err(SpawnError::UnknownArea(_))
            ));
            assert_eq!(orch.clear_area("nope", ctx), 0);
        });
        assert!(!sb.orchestrator_mut().set_auto_start("nope", true));
        assert!(sb.orchestrator().status("nope").is_none());
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn toggle_flips_state() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        sb.with_context(|orch, ctx| {
            assert!(orch.toggle_area("farm", &mut *ctx.scheduler));
            assert_eq!(orch.active_area_names(), vec!["farm"]);
            assert!(orch.toggle_area("farm", &mut *ctx.scheduler));
            assert_eq!(orch.active_area_count(), 0);
        });
    }

    #[test]
    fn remove_area_shuts_down_its_entities() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        sb.with_context(|orch, ctx| orch.start_area("farm", &mut *ctx.scheduler));
        sb.run(11);
        assert_eq!(sb.orchestrator().total_tracked_entities(), 3);
        let handles: Vec<_> = sb.orchestrator().scheduler("farm").unwrap().tracked().collect();

        assert!(sb.with_context(|orch, ctx| orch.remove_area("farm", ctx)));
        assert!(!sb.orchestrator().has_area("farm"));
        assert!(handles.iter().all(|&h| !sb.world().is_valid(h)));
        assert_eq!(sb.clock().len(), 1, "only the registry sweep remains");
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn update_area_changes_definition_and_scheduler() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        sb.with_context(|orch, ctx| {
            assert!(orch.update_area("farm", 7, 9, &mut *ctx.scheduler));
            assert!(!orch.update_area("farm", 0, 9, &mut *ctx.scheduler));
        });
        let orch = sb.orchestrator();
        assert_eq!(orch.definition("farm").unwrap().population_cap(), 7);
        assert_eq!(orch.scheduler("farm").unwrap().spawn_interval(), 9);
        assert_eq!(store.snapshot()["farm"].population_cap, 7);
    }

    #[test]
    fn update_region_restarts_active_area() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        let moved = Region::new("w", BlockPos::new(100, 64, 100), BlockPos::new(110, 64, 110));
        sb.with_context(|orch, ctx| {
            orch.start_area("farm", &mut *ctx.scheduler);
            let before = orch.scheduler("farm").unwrap().spawn_task();
            assert!(orch.update_region("farm", moved.clone(), &mut *ctx.scheduler));
            let scheduler = orch.scheduler("farm").unwrap();
            assert!(scheduler.is_active());
            assert_ne!(scheduler.spawn_task(), before);
        });
        assert_eq!(sb.orchestrator().definition("farm").unwrap().region(), &moved);
    }

    #[test]
    fn update_types_requires_resolvable_types() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        let registry = TypeRegistry::new();
        let orch = sb.orchestrator_mut();
        assert!(!orch.update_area_types("farm", vec![TypeId::new("dragon")], &registry));
        assert!(!orch.update_area_types("farm", vec![], &registry));
        assert!(orch.update_area_types(
            "farm",
            vec![TypeId::new("PIG"), TypeId::new("SHEEP")],
            &registry
        ));
        assert_eq!(orch.scheduler("farm").unwrap().allowed_types().len(), 2);
    }

    #[test]
    fn start_all_and_stop_all() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        let registry = TypeRegistry::new();
        sb.orchestrator_mut()
            .create_area("pen", region(), cows(), 1, 1, &registry);
        sb.with_context(|orch, ctx| {
            assert_eq!(orch.start_all(&mut *ctx.scheduler), 2);
            orch.stop_all(&mut *ctx.scheduler);
            assert_eq!(orch.active_area_count(), 0);
        });
        assert_eq!(sb.clock().len(), 1);
    }

    #[test]
    fn clear_all_counts_every_area() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        let registry = TypeRegistry::new();
        sb.orchestrator_mut()
            .create_area("pen", region(), cows(), 2, 1, &registry);
        sb.with_context(|orch, ctx| orch.start_all(&mut *ctx.scheduler));
        sb.run(11);
        assert_eq!(sb.orchestrator().total_tracked_entities(), 5);
        assert_eq!(sb.with_context(|orch, ctx| orch.clear_all(ctx)), 5);
        assert_eq!(sb.orchestrator().total_tracked_entities(), 0);
        assert_eq!(sb.world().live_count(), 0);
        assert_eq!(sb.orchestrator().active_area_count(), 2);
    }

    #[test]
    fn persistence_failure_keeps_memory_state() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let sb = with_farm(&store);
        assert!(sb.orchestrator().has_area("farm"));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn reload_drops_unpersisted_changes() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        store.set_failing(true);
        let registry = TypeRegistry::new();
        sb.orchestrator_mut()
            .create_area("lost", region(), cows(), 1, 1, &registry);
        store.set_failing(false);

        let loaded = sb.with_context(|orch, ctx| orch.reload_areas(ctx)).unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(sb.orchestrator().area_names(), vec!["farm"]);
    }

    #[test]
    fn auto_start_areas_start_on_load() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        assert!(sb.orchestrator_mut().set_auto_start("farm", true));
        let loaded = sb.with_context(|orch, ctx| orch.reload_areas(ctx)).unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(sb.orchestrator().active_area_names(), vec!["farm"]);
    }

    #[test]
    fn auto_start_can_be_disabled_by_config() {
        let store = MemoryStore::new();
        let mut stored = StoredAreas::new();
        let def = AreaDefinition::new("farm", region(), cows(), 3, 5)
            .unwrap()
            .with_auto_start(true);
        stored.insert("farm".into(), StoredArea::from(&def));
        store.replace(stored);

        let sb = Sandbox::open(
            SandboxWorld::new(63),
            TypeRegistry::new(),
            Box::new(store.clone()),
            SpawnConfig::default().with_auto_start_on_load(false),
        )
        .unwrap();
        assert!(sb.orchestrator().has_area("farm"));
        assert_eq!(sb.orchestrator().active_area_count(), 0);
    }

    #[test]
    fn invalid_stored_areas_are_skipped() {
        let store = MemoryStore::new();
        let mut stored = StoredAreas::new();
        let def = AreaDefinition::new("farm", region(), cows(), 3, 5).unwrap();
        let mut broken = StoredArea::from(&def);
        broken.allowed_types.clear();
        stored.insert("farm".into(), StoredArea::from(&def));
        stored.insert("broken".into(), broken);
        store.replace(stored);

        let sb = sandbox(&store);
        assert_eq!(sb.orchestrator().area_names(), vec!["farm"]);
    }

    #[test]
    fn shutdown_all_is_terminal() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        sb.with_context(|orch, ctx| orch.start_area("farm", &mut *ctx.scheduler));
        sb.run(6);
        let removed = sb.with_context(|orch, ctx| orch.shutdown_all(ctx));
        assert_eq!(removed, 2);
        assert_eq!(sb.orchestrator().area_count(), 0);
        assert!(sb.clock().is_empty());
        assert_eq!(sb.world().live_count(), 0);
        assert!(store.snapshot().contains_key("farm"));
    }

    #[test]
    fn status_reports_runtime_and_config() {
        let store = MemoryStore::new();
        let mut sb = with_farm(&store);
        sb.with_context(|orch, ctx| orch.start_area("farm", &mut *ctx.scheduler));
        sb.run(1);
        let status = sb.orchestrator().status("farm").unwrap();
        assert!(status.active);
        assert_eq!(status.tracked, 1);
        assert_eq!(status.population_cap, 3);
        assert_eq!(status.check_interval, 20);
        assert_eq!(sb.orchestrator().statuses().len(), 1);
    }
}
