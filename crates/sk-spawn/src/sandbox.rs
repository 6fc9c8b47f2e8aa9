//! In-memory host used by tests and the `simulate` command.
//!
//! [`SandboxWorld`] implements [`HostWorld`] over a map of entities with a
//! flat terrain that can be raised per column. [`Sandbox`] wires it to a
//! [`TickScheduler`], a registry, an orchestrator and a death resolver, and
//! drives them tick by tick the way a real host's main loop would.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use sk_core::{
    EntityHandle, EntityKind, HostWorld, ItemStack, Location, SpawnFailed, SpawnRequest, TypeId,
    TypeRegistry, WorldId,
};
use tracing::trace;

use crate::clock::TickScheduler;
use crate::config::SpawnConfig;
use crate::context::SpawnContext;
use crate::death::{DeathEvent, DeathOutcome, DeathResolver};
use crate::error::SpawnResult;
use crate::orchestrator::AreaOrchestrator;
use crate::store::AreaStore;

/// One live entity in the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxEntity {
    /// Built-in kind the entity was spawned as.
    pub kind: EntityKind,
    /// Current position.
    pub location: Location,
    /// Custom mob type, if the spawn carried one.
    pub type_id: Option<TypeId>,
}

/// In-memory world with deterministic handles.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    entities: BTreeMap<EntityHandle, SandboxEntity>,
    next_id: u128,
    default_height: i32,
    heights: HashMap<(WorldId, i32, i32), i32>,
    refused: HashSet<EntityKind>,
    default_drops: Vec<ItemStack>,
    default_experience: u32,
    spawn_calls: usize,
    remove_calls: usize,
}

impl SandboxWorld {
    /// A world whose terrain is `default_height` everywhere.
    pub fn new(default_height: i32) -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 0,
            default_height,
            heights: HashMap::new(),
            refused: HashSet::new(),
            default_drops: Vec::new(),
            default_experience: 0,
            spawn_calls: 0,
            remove_calls: 0,
        }
    }

    /// Drops and experience every death starts with before resolution.
    pub fn with_default_drops(mut self, drops: Vec<ItemStack>, experience: u32) -> Self {
        self.default_drops = drops;
        self.default_experience = experience;
        self
    }

    /// Override terrain height for one column.
    pub fn set_height(&mut self, world: impl Into<WorldId>, x: i32, z: i32, height: i32) {
        self.heights.insert((world.into(), x, z), height);
    }

    /// Make every spawn of `kind` fail.
    pub fn refuse(&mut self, kind: EntityKind) {
        self.refused.insert(kind);
    }

    /// Allow `kind` to spawn again.
    pub fn allow(&mut self, kind: EntityKind) {
        self.refused.remove(&kind);
    }

    /// Teleport an entity. False if it does not exist.
    pub fn move_entity(&mut self, handle: EntityHandle, to: Location) -> bool {
        match self.entities.get_mut(&handle) {
            Some(entity) => {
                entity.location = to;
                true
            }
            None => false,
        }
    }

    /// Kill an entity, returning the death notification the host would send.
    pub fn kill(&mut self, handle: EntityHandle) -> Option<DeathEvent> {
        let entity = self.entities.remove(&handle)?;
        trace!(%handle, kind = %entity.kind, "entity died");
        Some(DeathEvent::new(
            handle,
            entity.location,
            self.default_drops.clone(),
            self.default_experience,
        ))
    }

    /// Look up a live entity.
    pub fn entity(&self, handle: EntityHandle) -> Option<&SandboxEntity> {
        self.entities.get(&handle)
    }

    /// Live entity handles, in handle order.
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities.keys().copied()
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of `spawn_entity` calls, successful or not.
    pub fn spawn_calls(&self) -> usize {
        self.spawn_calls
    }

    /// Number of `remove_entity` calls.
    pub fn remove_calls(&self) -> usize {
        self.remove_calls
    }
}

impl HostWorld for SandboxWorld {
    fn spawn_entity(&mut self, request: &SpawnRequest<'_>) -> Result<EntityHandle, SpawnFailed> {
        self.spawn_calls += 1;
        if self.refused.contains(&request.kind) {
            return Err(SpawnFailed::new(request.kind, "refused by sandbox"));
        }
        self.next_id += 1;
        let handle = EntityHandle::from_u128(self.next_id);
        self.entities.insert(
            handle,
            SandboxEntity {
                kind: request.kind,
                location: request.at.clone(),
                type_id: request.type_id.cloned(),
            },
        );
        Ok(handle)
    }

    fn remove_entity(&mut self, handle: EntityHandle) {
        self.remove_calls += 1;
        self.entities.remove(&handle);
    }

    fn is_valid(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(&handle)
    }

    fn location_of(&self, handle: EntityHandle) -> Option<Location> {
        self.entities.get(&handle).map(|e| e.location.clone())
    }

    fn terrain_height_at(&self, world: &WorldId, x: i32, z: i32) -> i32 {
        self.heights
            .get(&(world.clone(), x, z))
            .copied()
            .unwrap_or(self.default_height)
    }
}

/// Counters from one [`Sandbox::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks due this tick.
    pub due: usize,
    /// Tasks that ran.
    pub handled: usize,
}

/// A host loop in a box: world, clock, registry, orchestrator and resolver.
#[derive(Debug)]
pub struct Sandbox {
    world: SandboxWorld,
    clock: TickScheduler,
    registry: TypeRegistry,
    rng: StdRng,
    orchestrator: AreaOrchestrator,
    resolver: DeathResolver,
}

impl Sandbox {
    /// Load every area from `store` and register the registry sweep.
    pub fn open(
        mut world: SandboxWorld,
        mut registry: TypeRegistry,
        store: Box<dyn AreaStore>,
        config: SpawnConfig,
    ) -> SpawnResult<Self> {
        let mut clock = TickScheduler::new();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let resolver = DeathResolver::new(config.seed.wrapping_add(1));

        let mut ctx = SpawnContext::new(&mut world, &mut clock, &mut registry, &mut rng);
        let mut orchestrator = AreaOrchestrator::open(store, config, &mut ctx)?;
        orchestrator.start_maintenance(&mut clock);

        Ok(Self {
            world,
            clock,
            registry,
            rng,
            orchestrator,
            resolver,
        })
    }

    /// Run `f` with the orchestrator and a context over this sandbox.
    pub fn with_context<T>(
        &mut self,
        f: impl FnOnce(&mut AreaOrchestrator, &mut SpawnContext<'_>) -> T,
    ) -> T {
        let mut ctx = SpawnContext::new(
            &mut self.world,
            &mut self.clock,
            &mut self.registry,
            &mut self.rng,
        );
        f(&mut self.orchestrator, &mut ctx)
    }

    /// Advance one tick and run every task due on it.
    ///
    /// A task canceled by an earlier task of the same tick is skipped.
    pub fn tick(&mut self) -> TickReport {
        let due = self.clock.advance();
        let mut report = TickReport {
            due: due.len(),
            handled: 0,
        };
        for (task_ref, task) in due {
            if !self.clock.is_scheduled(task_ref) {
                continue;
            }
            let handled = self.with_context(|orch, ctx| orch.dispatch(task_ref, &task, ctx));
            if handled {
                report.handled += 1;
            }
        }
        report
    }

    /// Advance `n` ticks.
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Kill an entity and resolve its death. None if it did not exist.
    pub fn kill(&mut self, handle: EntityHandle) -> Option<(DeathEvent, DeathOutcome)> {
        let mut event = self.world.kill(handle)?;
        let outcome = self.resolver.resolve(&mut self.registry, &mut event);
        Some((event, outcome))
    }

    /// The in-memory world.
    pub fn world(&self) -> &SandboxWorld {
        &self.world
    }

    /// Mutable access to the world, e.g. to move or kill entities.
    pub fn world_mut(&mut self) -> &mut SandboxWorld {
        &mut self.world
    }

    /// The tick scheduler.
    pub fn clock(&self) -> &TickScheduler {
        &self.clock
    }

    /// The type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Mutable access to the type registry.
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// The spawn RNG.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// The orchestrator.
    pub fn orchestrator(&self) -> &AreaOrchestrator {
        &self.orchestrator
    }

    /// Mutable access to the orchestrator.
    pub fn orchestrator_mut(&mut self) -> &mut AreaOrchestrator {
        &mut self.orchestrator
    }

    /// Split borrow for callers that need the registry while mutating the
    /// orchestrator, e.g. to create areas of custom types.
    pub fn orchestrator_and_registry(&mut self) -> (&mut AreaOrchestrator, &TypeRegistry) {
        (&mut self.orchestrator, &self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use sk_core::{BlockPos, Region};

    fn request<'a>(kind: EntityKind, at: &'a Location) -> SpawnRequest<'a> {
        SpawnRequest {
            kind,
            at,
            type_id: None,
            cosmetics: None,
        }
    }

    #[test]
    fn handles_are_sequential() {
        let mut world = SandboxWorld::new(0);
        let at = Location::new("w", 0.5, 1.0, 0.5);
        let a = world.spawn_entity(&request(EntityKind::Cow, &at)).unwrap();
        let b = world.spawn_entity(&request(EntityKind::Cow, &at)).unwrap();
        assert_eq!(a, EntityHandle::from_u128(1));
        assert_eq!(b, EntityHandle::from_u128(2));
        assert_eq!(world.live_count(), 2);
    }

    #[test]
    fn terrain_overrides_are_per_world() {
        let mut world = SandboxWorld::new(63);
        world.set_height("w", 1, 1, 80);
        assert_eq!(world.terrain_height_at(&WorldId::new("w"), 1, 1), 80);
        assert_eq!(world.terrain_height_at(&WorldId::new("nether"), 1, 1), 63);
        assert_eq!(world.terrain_height_at(&WorldId::new("w"), 2, 1), 63);
    }

    #[test]
    fn refused_kinds_fail_and_count() {
        let mut world = SandboxWorld::new(0);
        world.refuse(EntityKind::Creeper);
        let at = Location::new("w", 0.5, 1.0, 0.5);
        let err = world
            .spawn_entity(&request(EntityKind::Creeper, &at))
            .unwrap_err();
        assert_eq!(err.kind, EntityKind::Creeper);
        assert_eq!(world.spawn_calls(), 1);
        world.allow(EntityKind::Creeper);
        assert!(world.spawn_entity(&request(EntityKind::Creeper, &at)).is_ok());
    }

    #[test]
    fn kill_produces_default_drops() {
        let mut world =
            SandboxWorld::new(0).with_default_drops(vec![ItemStack::new("BONE", 1)], 3);
        let at = Location::new("w", 0.5, 1.0, 0.5);
        let handle = world.spawn_entity(&request(EntityKind::Skeleton, &at)).unwrap();
        let event = world.kill(handle).unwrap();
        assert_eq!(event.drops, vec![ItemStack::new("BONE", 1)]);
        assert_eq!(event.dropped_experience, 3);
        assert!(!world.is_valid(handle));
        assert!(world.kill(handle).is_none());
    }

    #[test]
    fn stopped_area_fires_nothing() {
        let store = MemoryStore::new();
        let mut sb = Sandbox::open(
            SandboxWorld::new(63),
            TypeRegistry::new(),
            Box::new(store),
            SpawnConfig::default().with_registry_sweep_interval(0),
        )
        .unwrap();
        let registry = TypeRegistry::new();
        let region = Region::new("w", BlockPos::new(0, 64, 0), BlockPos::new(4, 64, 4));
        sb.orchestrator_mut()
            .create_area("farm", region, vec![TypeId::new("COW")], 5, 1, &registry);
        sb.with_context(|orch, ctx| orch.start_area("farm", &mut *ctx.scheduler));
        sb.with_context(|orch, ctx| orch.stop_area("farm", &mut *ctx.scheduler));
        let report = sb.tick();
        assert_eq!(report, TickReport::default());
        assert_eq!(sb.world().spawn_calls(), 0);
    }

    #[test]
    fn tick_reports_handled_tasks() {
        let store = MemoryStore::new();
        let mut sb = Sandbox::open(
            SandboxWorld::new(63),
            TypeRegistry::new(),
            Box::new(store),
            SpawnConfig::default(),
        )
        .unwrap();
        let report = sb.tick();
        assert_eq!(report.due, 1, "registry sweep fires on the first tick");
        assert_eq!(report.handled, 1);
    }
}
