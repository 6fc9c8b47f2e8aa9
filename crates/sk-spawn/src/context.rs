use rand::rngs::StdRng;
use sk_core::{HostWorld, TaskScheduler, TypeRegistry};

/// Mutable host state passed to schedulers and the orchestrator on each call.
pub struct SpawnContext<'a> {
    /// Host world entities are spawned into and removed from.
    pub world: &'a mut dyn HostWorld,
    /// Host scheduler periodic tasks are registered with.
    pub scheduler: &'a mut dyn TaskScheduler,
    /// Mob types, loot tables and live associations.
    pub registry: &'a mut TypeRegistry,
    /// Randomness for spawn placement and type choice.
    pub rng: &'a mut StdRng,
}

impl<'a> SpawnContext<'a> {
    /// Bundle the host collaborators for one call.
    pub fn new(
        world: &'a mut dyn HostWorld,
        scheduler: &'a mut dyn TaskScheduler,
        registry: &'a mut TypeRegistry,
        rng: &'a mut StdRng,
    ) -> Self {
        Self {
            world,
            scheduler,
            registry,
            rng,
        }
    }
}
