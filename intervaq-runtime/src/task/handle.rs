use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use tracing::debug;

use super::{TaskId, TaskKind, TaskState, TimedTask};
use crate::clock::Timestamp;
use crate::registry::SharedTask;
use crate::scheduler::Shared;
use crate::sync::lock;

/// Handle to a task returned by the scheduler's factory methods.
///
/// Handles are cheap to clone and compare by task identity. A handle stays
/// valid after its task is cancelled or evicted; it then reports
/// [`TaskState::Done`] and every operation becomes a no-op.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    task: SharedTask,
    owner: Weak<Shared>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, kind: TaskKind, task: SharedTask, owner: Weak<Shared>) -> Self {
        Self {
            id,
            kind,
            task,
            owner,
        }
    }

    pub(crate) fn is_owned_by(&self, shared: &Arc<Shared>) -> bool {
        std::ptr::eq(self.owner.as_ptr(), Arc::as_ptr(shared))
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn state(&self) -> TaskState {
        lock(&self.task).state()
    }

    pub fn period(&self) -> Timestamp {
        lock(&self.task).period()
    }

    /// Timestamp at which the task next becomes due.
    pub fn next_fire_at(&self) -> Timestamp {
        lock(&self.task).next_fire_at()
    }

    pub fn paused_at(&self) -> Option<Timestamp> {
        lock(&self.task).state().paused_at()
    }

    /// Number of times the callback has been invoked.
    pub fn fire_count(&self) -> u64 {
        lock(&self.task).fired()
    }

    /// Whether the task is still held by its scheduler.
    pub fn is_registered(&self) -> bool {
        let Some(shared) = self.owner.upgrade() else {
            return false;
        };
        let registry = lock(&shared.registry);
        registry.contains(self.id, self.kind)
    }

    /// Stop the task from firing while keeping it registered.
    /// Returns `false` if it was already disabled or is done.
    pub fn disable(&self) -> bool {
        let changed = lock(&self.task).disable();
        if changed {
            debug!(task = %self.id, "Disabled task");
        }
        changed
    }

    /// Re-arm a disabled task with a full period counted from now.
    pub fn enable(&self) -> bool {
        let changed = self.with_owner(|task, now, paused_since| {
            task.enable(now, paused_since.is_some())
        });
        if changed {
            debug!(task = %self.id, "Enabled task");
        }
        changed
    }

    /// Disable then enable: a fresh full-period countdown from now.
    pub fn restart(&self) -> bool {
        let changed = self.with_owner(|task, now, paused_since| {
            task.restart(now, paused_since.is_some())
        });
        if changed {
            debug!(task = %self.id, "Restarted task");
        }
        changed
    }

    /// Freeze this task alone, using the scheduler's clock.
    pub fn pause(&self) -> bool {
        match self.owner.upgrade() {
            Some(shared) => self.pause_at(shared.clock.now()),
            None => false,
        }
    }

    pub fn pause_at(&self, at: Timestamp) -> bool {
        lock(&self.task).pause(at)
    }

    /// Unfreeze a task paused on its own, using the scheduler's clock.
    ///
    /// Does nothing while the whole scheduler is paused; `resume_all` takes
    /// care of every paused task.
    pub fn resume(&self) -> bool {
        self.with_owner(|task, now, paused_since| paused_since.is_none() && task.resume(now))
    }

    pub fn resume_at(&self, at: Timestamp) -> bool {
        self.with_owner(|task, _, paused_since| paused_since.is_none() && task.resume(at))
    }

    /// Run `f` with the owning scheduler's clock reading and pause state.
    fn with_owner<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut TimedTask, Timestamp, Option<Timestamp>) -> bool,
    {
        let Some(shared) = self.owner.upgrade() else {
            return false;
        };
        let registry = lock(&shared.registry);
        let now = shared.clock.now();
        let mut task = lock(&self.task);
        f(&mut *task, now, registry.paused_since())
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.owner.ptr_eq(&other.owner)
    }
}

impl Eq for TaskHandle {}

impl Hash for TaskHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}
