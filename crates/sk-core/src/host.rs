//! Contracts the spawn engine consumes from its host.
//!
//! The host owns the simulated world and the tick loop. The engine only
//! queries it (validity, location, terrain height) and commands it (spawn,
//! remove, schedule, cancel). Everything runs on the host's single tick
//! thread, so none of these traits require `Send` or `Sync`.

use std::fmt;

use crate::entity::{EntityHandle, EntityKind};
use crate::mob::{Cosmetics, TypeId};
use crate::region::{Location, WorldId};

/// Everything the host needs to spawn one entity.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    /// Built-in kind to spawn.
    pub kind: EntityKind,
    /// Where to put it.
    pub at: &'a Location,
    /// Registered mob type this spawn came from, if any.
    pub type_id: Option<&'a TypeId>,
    /// Attributes the host should apply after spawning.
    pub cosmetics: Option<&'a Cosmetics>,
}

/// The host refused or failed to spawn an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to spawn {kind}: {reason}")]
pub struct SpawnFailed {
    /// Kind that was requested.
    pub kind: EntityKind,
    /// Host-provided reason.
    pub reason: String,
}

impl SpawnFailed {
    /// Create a spawn failure.
    pub fn new(kind: EntityKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// The simulated world the engine spawns into.
pub trait HostWorld {
    /// Spawn an entity, returning its handle.
    fn spawn_entity(&mut self, request: &SpawnRequest<'_>) -> Result<EntityHandle, SpawnFailed>;

    /// Remove an entity from the world. Unknown or already-removed handles
    /// are ignored.
    fn remove_entity(&mut self, handle: EntityHandle);

    /// Whether the entity still exists and is alive.
    fn is_valid(&self, handle: EntityHandle) -> bool;

    /// Current location of the entity, if the host can report one.
    fn location_of(&self, handle: EntityHandle) -> Option<Location>;

    /// Y of the highest solid block in the given column.
    fn terrain_height_at(&self, world: &WorldId, x: i32, z: i32) -> i32;
}

/// Reference to a periodic task registered with the host scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskRef(pub u64);

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// What a periodic task does when it fires.
///
/// The host scheduler hands these back to the engine on each due tick; the
/// engine routes them to the owning area.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScheduledTask {
    /// Spawn attempt for an area.
    Spawn {
        /// Area name.
        area: String,
    },
    /// Containment sweep for an area.
    ContainmentCheck {
        /// Area name.
        area: String,
    },
    /// Purge registry associations whose entities are gone.
    RegistrySweep,
}

impl ScheduledTask {
    /// Area this task belongs to, if any.
    pub fn area(&self) -> Option<&str> {
        match self {
            Self::Spawn { area } | Self::ContainmentCheck { area } => Some(area),
            Self::RegistrySweep => None,
        }
    }
}

impl fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { area } => write!(f, "spawn[{area}]"),
            Self::ContainmentCheck { area } => write!(f, "check[{area}]"),
            Self::RegistrySweep => write!(f, "registry-sweep"),
        }
    }
}

/// The host's periodic task scheduler.
///
/// A registered task first fires on the tick after registration and then
/// every `period_ticks`. Canceled tasks never fire again, even if already
/// due on the current tick.
pub trait TaskScheduler {
    /// Register a periodic task.
    fn schedule_periodic(&mut self, task: ScheduledTask, period_ticks: u32) -> TaskRef;

    /// Cancel a task. Returns false if it was not registered.
    fn cancel(&mut self, task: TaskRef) -> bool;
}
