//! Core types for Spawnkeep: regions, spawn areas, mob types, and loot.
//!
//! This crate holds the data model the spawn engine runs on and the
//! contracts it expects from the host world. It does no scheduling of its
//! own; `sk-spawn` drives everything here from the host's tick loop.

/// Spawn area configuration.
pub mod area;
/// Entity handles and built-in entity kinds.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Collaborator contracts consumed from the host world and scheduler.
pub mod host;
/// Loot tables, loot entries, and generated item stacks.
pub mod loot;
/// Custom mob type definitions.
pub mod mob;
/// World ids, block positions, locations, and axis-aligned regions.
pub mod region;
/// Registry of mob types, loot tables, and live entity associations.
pub mod registry;

/// Re-export area types.
pub use area::{AreaDefinition, DEFAULT_CHECK_INTERVAL};
/// Re-export entity types.
pub use entity::{EntityHandle, EntityKind};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export host contracts.
pub use host::{HostWorld, ScheduledTask, SpawnFailed, SpawnRequest, TaskRef, TaskScheduler};
/// Re-export loot types.
pub use loot::{ItemKind, ItemStack, LootEntry, LootTable, LootTableId};
/// Re-export mob types.
pub use mob::{Cosmetics, TypeDefinition, TypeId};
/// Re-export geometry types.
pub use region::{BlockPos, Location, Region, WorldId};
/// Re-export the registry.
pub use registry::{SpawnTarget, TypeRegistry};
