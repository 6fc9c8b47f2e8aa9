use std::collections::BTreeSet;

use rand::Rng;
use sk_core::{
    AreaDefinition, EntityHandle, Location, Region, ScheduledTask, SpawnRequest, SpawnTarget,
    TaskRef, TaskScheduler, TypeId,
};
use tracing::{debug, info, trace, warn};

use crate::context::SpawnContext;

/// Lifecycle state of a [`SpawnScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// No tasks are scheduled.
    #[default]
    Inactive,
    /// Spawn and check tasks are scheduled.
    Active,
}

/// Result of one containment sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Handles dropped because the host no longer knows them.
    pub dropped_invalid: usize,
    /// Entities removed from the world for leaving the region.
    pub removed_outside: usize,
}

/// Per-area runtime: two periodic tasks and the set of entities it spawned.
///
/// Holds a snapshot of its area's configuration. The orchestrator keeps the
/// snapshot in sync with the persisted [`AreaDefinition`] through the setters.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    area: String,
    region: Option<Region>,
    allowed_types: Vec<TypeId>,
    population_cap: u32,
    spawn_interval: u32,
    check_interval: u32,
    tracked: BTreeSet<EntityHandle>,
    state: SchedulerState,
    spawn_task: Option<TaskRef>,
    check_task: Option<TaskRef>,
}

impl SpawnScheduler {
    /// An inactive scheduler configured from an area definition.
    pub fn new(definition: &AreaDefinition) -> Self {
        Self {
            area: definition.name().to_string(),
            region: Some(definition.region().clone()),
            allowed_types: definition.allowed_types().to_vec(),
            population_cap: definition.population_cap(),
            spawn_interval: definition.spawn_interval(),
            check_interval: definition.check_interval(),
            tracked: BTreeSet::new(),
            state: SchedulerState::Inactive,
            spawn_task: None,
            check_task: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Register the spawn and containment tasks and become active.
    ///
    /// An active scheduler is stopped first, so calling this twice restarts
    /// it. Returns false, leaving the scheduler inactive, if no region is set.
    pub fn start(&mut self, tasks: &mut dyn TaskScheduler) -> bool {
        if self.region.is_none() {
            warn!(area = %self.area, "cannot start: no region defined");
            return false;
        }
        if self.is_active() {
            self.stop(tasks);
        }
        self.spawn_task = Some(tasks.schedule_periodic(
            ScheduledTask::Spawn {
                area: self.area.clone(),
            },
            self.spawn_interval,
        ));
        self.check_task = Some(tasks.schedule_periodic(
            ScheduledTask::ContainmentCheck {
                area: self.area.clone(),
            },
            self.check_interval,
        ));
        self.state = SchedulerState::Active;
        info!(
            area = %self.area,
            spawn_interval = self.spawn_interval,
            check_interval = self.check_interval,
            "spawn area started"
        );
        true
    }

    /// Cancel both periodic tasks and become inactive. Idempotent.
    pub fn stop(&mut self, tasks: &mut dyn TaskScheduler) {
        if let Some(task) = self.spawn_task.take() {
            tasks.cancel(task);
        }
        if let Some(task) = self.check_task.take() {
            tasks.cancel(task);
        }
        if self.is_active() {
            info!(area = %self.area, tracked = self.tracked.len(), "spawn area stopped");
        }
        self.state = SchedulerState::Inactive;
    }

    /// Stop and start again, only if currently active.
    pub fn restart(&mut self, tasks: &mut dyn TaskScheduler) -> bool {
        if !self.is_active() {
            return false;
        }
        self.stop(tasks);
        self.start(tasks)
    }

    /// Stop, then remove every tracked entity from the world.
    ///
    /// Terminal call before the scheduler is dropped. Returns the number of
    /// entities that were still alive and got removed.
    pub fn shutdown(&mut self, ctx: &mut SpawnContext<'_>) -> usize {
        self.stop(&mut *ctx.scheduler);
        self.clear_all(ctx)
    }

    /// Remove every tracked entity from the world and from the registry.
    ///
    /// Returns how many were still alive. The scheduler keeps its state.
    pub fn clear_all(&mut self, ctx: &mut SpawnContext<'_>) -> usize {
        let mut removed = 0;
        for handle in std::mem::take(&mut self.tracked) {
            if ctx.world.is_valid(handle) {
                ctx.world.remove_entity(handle);
                removed += 1;
            }
            ctx.registry.untrack(handle);
        }
        if removed > 0 {
            info!(area = %self.area, removed, "cleared tracked entities");
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Periodic operations
    // -----------------------------------------------------------------------

    /// Route a fired task to the matching operation.
    ///
    /// Tasks whose ref does not match a currently registered task of this
    /// scheduler are ignored. Returns whether the task was handled.
    pub fn fire(
        &mut self,
        task_ref: TaskRef,
        task: &ScheduledTask,
        ctx: &mut SpawnContext<'_>,
    ) -> bool {
        match task {
            ScheduledTask::Spawn { .. } if self.spawn_task == Some(task_ref) => {
                self.run_spawn(ctx);
                true
            }
            ScheduledTask::ContainmentCheck { .. } if self.check_task == Some(task_ref) => {
                self.run_containment_check(ctx);
                true
            }
            _ => {
                trace!(area = %self.area, task = %task, %task_ref, "ignoring stale task");
                false
            }
        }
    }

    /// One spawn attempt. No-op while inactive or at the population cap.
    ///
    /// Host spawn failures are logged and swallowed. Returns the new handle
    /// on success.
    pub fn run_spawn(&mut self, ctx: &mut SpawnContext<'_>) -> Option<EntityHandle> {
        if !self.is_active() {
            return None;
        }
        if self.tracked.len() >= self.population_cap as usize {
            trace!(area = %self.area, cap = self.population_cap, "population cap reached");
            return None;
        }
        let region = self.region.as_ref()?;
        if self.allowed_types.is_empty() {
            return None;
        }

        let (x, z) = region.random_column(&mut *ctx.rng);
        let ground = ctx.world.terrain_height_at(region.world(), x, z);
        let Some(y) = ground.checked_add(1) else {
            debug!(area = %self.area, x, z, ground, "no room above terrain; skipping spawn");
            return None;
        };
        if !region.contains_y(y) {
            // Kept as-is: the spawn height follows the terrain, not the region.
            debug!(area = %self.area, x, y, z, "spawn point lies outside the region's vertical bounds");
        }
        let at = Location::new(
            region.world().clone(),
            f64::from(x) + 0.5,
            f64::from(y),
            f64::from(z) + 0.5,
        );

        let type_id = &self.allowed_types[ctx.rng.random_range(0..self.allowed_types.len())];
        let Some(target) = ctx.registry.spawn_target(type_id) else {
            warn!(area = %self.area, spawn_type = %type_id, "allowed type does not resolve; skipping spawn");
            return None;
        };
        let custom = matches!(target, SpawnTarget::Custom(_));
        let request = match target {
            SpawnTarget::Custom(def) => SpawnRequest {
                kind: def.kind(),
                at: &at,
                type_id: Some(type_id),
                cosmetics: Some(def.cosmetics()),
            },
            SpawnTarget::Builtin(kind) => SpawnRequest {
                kind,
                at: &at,
                type_id: None,
                cosmetics: None,
            },
        };

        match ctx.world.spawn_entity(&request) {
            Ok(handle) => {
                self.tracked.insert(handle);
                if custom {
                    ctx.registry.track(handle, type_id.clone());
                }
                debug!(area = %self.area, %handle, spawn_type = %type_id, at = %at, "spawned entity");
                Some(handle)
            }
            Err(err) => {
                warn!(area = %self.area, error = %err, "spawn failed");
                None
            }
        }
    }

    /// Drop dead handles and remove entities that left the region.
    ///
    /// A live entity whose location the host cannot report is kept until a
    /// later sweep.
    pub fn run_containment_check(&mut self, ctx: &mut SpawnContext<'_>) -> SweepReport {
        let mut report = SweepReport::default();
        if !self.is_active() {
            return report;
        }
        let Some(region) = self.region.as_ref() else {
            return report;
        };
        let area = &self.area;

        self.tracked.retain(|&handle| {
            if !ctx.world.is_valid(handle) {
                report.dropped_invalid += 1;
                return false;
            }
            match ctx.world.location_of(handle) {
                Some(location) if !region.contains(&location) => {
                    ctx.world.remove_entity(handle);
                    ctx.registry.untrack(handle);
                    report.removed_outside += 1;
                    debug!(area = %area, %handle, at = %location, "removed entity outside region");
                    false
                }
                Some(_) => true,
                None => {
                    debug!(area = %area, %handle, "no location reported; keeping");
                    true
                }
            }
        });

        if report.dropped_invalid + report.removed_outside > 0 {
            debug!(
                area = %self.area,
                dropped = report.dropped_invalid,
                removed = report.removed_outside,
                remaining = self.tracked.len(),
                "containment sweep"
            );
        }
        report
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Change the population cap. Takes effect on the next spawn attempt.
    pub fn set_population_cap(&mut self, cap: u32) {
        self.population_cap = cap;
    }

    /// Change the spawn interval, rescheduling the spawn task if active.
    pub fn set_spawn_interval(&mut self, ticks: u32, tasks: &mut dyn TaskScheduler) {
        self.spawn_interval = ticks;
        if let Some(old) = self.spawn_task.take() {
            tasks.cancel(old);
            self.spawn_task = Some(tasks.schedule_periodic(
                ScheduledTask::Spawn {
                    area: self.area.clone(),
                },
                ticks,
            ));
        }
    }

    /// Change the check interval, rescheduling the check task if active.
    pub fn set_check_interval(&mut self, ticks: u32, tasks: &mut dyn TaskScheduler) {
        self.check_interval = ticks;
        if let Some(old) = self.check_task.take() {
            tasks.cancel(old);
            self.check_task = Some(tasks.schedule_periodic(
                ScheduledTask::ContainmentCheck {
                    area: self.area.clone(),
                },
                ticks,
            ));
        }
    }

    /// Replace the allowed types. Takes effect on the next spawn attempt.
    pub fn set_allowed_types(&mut self, types: Vec<TypeId>) {
        self.allowed_types = types;
    }

    /// Replace the region. An active scheduler is restarted, which leaves it
    /// inactive when the region is cleared.
    pub fn set_region(&mut self, region: Option<Region>, tasks: &mut dyn TaskScheduler) {
        self.region = region;
        if self.is_active() && !self.restart(tasks) {
            warn!(area = %self.area, "region cleared; scheduler stopped");
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Area name.
    pub fn area(&self) -> &str {
        &self.area
    }

    /// Lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether the periodic tasks are registered.
    pub fn is_active(&self) -> bool {
        self.state == SchedulerState::Active
    }

    /// Region snapshot.
    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Allowed types snapshot.
    pub fn allowed_types(&self) -> &[TypeId] {
        &self.allowed_types
    }

    /// Maximum tracked entities.
    pub fn population_cap(&self) -> u32 {
        self.population_cap
    }

    /// Ticks between spawn attempts.
    pub fn spawn_interval(&self) -> u32 {
        self.spawn_interval
    }

    /// Ticks between containment checks.
    pub fn check_interval(&self) -> u32 {
        self.check_interval
    }

    /// Number of tracked entities.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Whether the handle is tracked by this scheduler.
    pub fn is_tracking(&self, handle: EntityHandle) -> bool {
        self.tracked.contains(&handle)
    }

    /// Tracked handles, in handle order.
    pub fn tracked(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.tracked.iter().copied()
    }

    /// Registered spawn task, while active.
    pub fn spawn_task(&self) -> Option<TaskRef> {
        self.spawn_task
    }

    /// Registered containment task, while active.
    pub fn check_task(&self) -> Option<TaskRef> {
        self.check_task
    }
}
