use std::fmt;

use crate::clock::Timestamp;

/// Identity of a task within its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interval or timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Fires every period until cancelled or disabled.
    Repeating,
    /// Fires once, then is evicted from its scheduler.
    OneShot,
}

/// Lifecycle state of a task. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskState {
    /// Kept in its scheduler but never fires until enabled again.
    Disabled,
    /// Countdown frozen since `since`; resuming shifts the schedule by the
    /// time spent here.
    Paused { since: Timestamp },
    /// Counting down, fires once `now >= next_fire_at`.
    Pending,
    /// Callback is running right now.
    Executing,
    /// Fired (one-shot) or destroyed. Terminal.
    Done,
}

impl TaskState {
    pub fn paused_at(&self) -> Option<Timestamp> {
        match self {
            TaskState::Paused { since } => Some(*since),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskState::Done)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Disabled => write!(f, "disabled"),
            TaskState::Paused { since } => write!(f, "paused since {since}"),
            TaskState::Pending => write!(f, "pending"),
            TaskState::Executing => write!(f, "executing"),
            TaskState::Done => write!(f, "done"),
        }
    }
}
