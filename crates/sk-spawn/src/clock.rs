use std::collections::BTreeMap;

use sk_core::{ScheduledTask, TaskRef, TaskScheduler};

#[derive(Debug, Clone)]
struct Registration {
    task: ScheduledTask,
    period: u64,
    next_due: u64,
}

/// Deterministic periodic task scheduler driven by a monotonic tick counter.
///
/// Stands in for the host's scheduler in tests and the sandbox. Tasks fire
/// first on the tick after registration and then every `period` ticks.
#[derive(Debug, Clone, Default)]
pub struct TickScheduler {
    tick: u64,
    next_id: u64,
    tasks: BTreeMap<TaskRef, Registration>,
}

impl TickScheduler {
    /// A scheduler at tick 0 with no tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick and return the tasks due on it, in registration order.
    pub fn advance(&mut self) -> Vec<(TaskRef, ScheduledTask)> {
        self.tick += 1;
        let now = self.tick;
        let mut due = Vec::new();
        for (task_ref, reg) in &mut self.tasks {
            if reg.next_due <= now {
                due.push((*task_ref, reg.task.clone()));
                reg.next_due = now + reg.period;
            }
        }
        due
    }

    /// Current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether the task is still registered.
    pub fn is_scheduled(&self, task: TaskRef) -> bool {
        self.tasks.contains_key(&task)
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registered tasks, in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = (TaskRef, &ScheduledTask)> {
        self.tasks.iter().map(|(r, reg)| (*r, &reg.task))
    }
}

impl TaskScheduler for TickScheduler {
    fn schedule_periodic(&mut self, task: ScheduledTask, period_ticks: u32) -> TaskRef {
        self.next_id += 1;
        let task_ref = TaskRef(self.next_id);
        self.tasks.insert(
            task_ref,
            Registration {
                task,
                period: u64::from(period_ticks.max(1)),
                next_due: self.tick + 1,
            },
        );
        task_ref
    }

    fn cancel(&mut self, task: TaskRef) -> bool {
        self.tasks.remove(&task).is_some()
    }
}
