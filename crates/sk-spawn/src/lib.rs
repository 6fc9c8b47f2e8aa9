//! Area scheduling and entity lifecycle engine for Spawnkeep.
//!
//! Every spawn area gets a [`SpawnScheduler`] with two periodic tasks on the
//! host's tick loop: one spawns entities up to the population cap, the other
//! removes entities that wandered out of the region. The
//! [`AreaOrchestrator`] owns all areas by name and persists their
//! definitions. The [`DeathResolver`] swaps default drops of custom mobs for
//! their loot table's output. All of it runs on the host's single tick
//! thread and reaches the host only through the [`SpawnContext`].

/// Mob type and loot table catalog files.
pub mod catalog;
/// Deterministic tick scheduler.
pub mod clock;
/// Configuration for the spawn engine.
pub mod config;
/// Mutable host context passed to every operation.
pub mod context;
/// Death resolution and loot replacement.
pub mod death;
/// Error types for the spawn crate.
pub mod error;
/// Multi-area manager.
pub mod orchestrator;
/// In-memory host for tests and simulation.
pub mod sandbox;
/// Per-area spawn and containment scheduler.
pub mod scheduler;
/// Area definition persistence.
pub mod store;

/// Re-exports of [`catalog::Catalog`] and [`catalog::CatalogSummary`].
pub use catalog::{Catalog, CatalogSummary};
/// Re-export of [`clock::TickScheduler`].
pub use clock::TickScheduler;
/// Re-export of [`config::SpawnConfig`].
pub use config::SpawnConfig;
/// Re-export of [`context::SpawnContext`].
pub use context::SpawnContext;
/// Re-exports of death resolution types.
pub use death::{DeathEvent, DeathOutcome, DeathResolver};
/// Re-exports of [`error::SpawnError`] and [`error::SpawnResult`].
pub use error::{SpawnError, SpawnResult};
/// Re-exports of [`orchestrator::AreaOrchestrator`] and [`orchestrator::AreaStatus`].
pub use orchestrator::{AreaOrchestrator, AreaStatus};
/// Re-exports of sandbox types.
pub use sandbox::{Sandbox, SandboxEntity, SandboxWorld, TickReport};
/// Re-exports of scheduler types.
pub use scheduler::{SchedulerState, SpawnScheduler, SweepReport};
/// Re-exports of store types.
pub use store::{AreaStore, JsonFileStore, MemoryStore, StoredArea, StoredAreas, StoredRegion};
