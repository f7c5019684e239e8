use std::fmt;
use std::mem;

use super::{TaskId, TaskKind, TaskResult, TaskState};
use crate::clock::Timestamp;

pub(crate) type Callback = Box<dyn FnMut() -> TaskResult + Send>;

/// Stand-in callback for tasks that are firing or destroyed.
pub(crate) fn noop() -> Callback {
    Box::new(|| Ok(()))
}

/// One interval or timeout and its state machine.
///
/// All methods are plain state transitions; the scheduler decides when to
/// call them and runs the callback outside of any lock.
pub(crate) struct TimedTask {
    id: TaskId,
    kind: TaskKind,
    callback: Callback,
    period: Timestamp,
    next_fire_at: Timestamp,
    state: TaskState,
    fired: u64,
}

impl TimedTask {
    /// `period` must already be validated.
    pub(crate) fn new(
        id: TaskId,
        kind: TaskKind,
        callback: Callback,
        period: Timestamp,
        now: Timestamp,
        start_paused: bool,
    ) -> Self {
        // Created during a global pause: freeze right away so the pause
        // does not count against the first period.
        let state = if start_paused {
            TaskState::Paused { since: now }
        } else {
            TaskState::Pending
        };

        Self {
            id,
            kind,
            callback,
            period,
            next_fire_at: now + period,
            state,
            fired: 0,
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        self.state
    }

    pub(crate) fn period(&self) -> Timestamp {
        self.period
    }

    pub(crate) fn next_fire_at(&self) -> Timestamp {
        self.next_fire_at
    }

    pub(crate) fn fired(&self) -> u64 {
        self.fired
    }

    /// Enter `Executing` if the task is due at `now` and hand out its
    /// callback. Repeating tasks are rescheduled from `now`, not from the
    /// missed deadline, so a late poll fires once instead of catching up.
    pub(crate) fn begin_fire(&mut self, now: Timestamp) -> Option<Callback> {
        if self.state != TaskState::Pending || now < self.next_fire_at {
            return None;
        }

        self.state = TaskState::Executing;
        if self.kind == TaskKind::Repeating {
            self.next_fire_at = now + self.period;
        }
        Some(mem::replace(&mut self.callback, noop()))
    }

    /// Complete a fire started by [`begin_fire`](Self::begin_fire).
    ///
    /// Whatever the callback did to its own task (disable, restart, cancel)
    /// is kept; only a task still `Executing` goes back to `Pending`, or to
    /// `Paused` when the scheduler got paused meanwhile. Returns the callback
    /// when the task no longer needs it.
    pub(crate) fn finish_fire(
        &mut self,
        callback: Callback,
        paused_since: Option<Timestamp>,
    ) -> Option<Callback> {
        self.fired += 1;

        match self.kind {
            TaskKind::OneShot => {
                self.state = TaskState::Done;
                Some(callback)
            }
            TaskKind::Repeating if self.state.is_done() => Some(callback),
            TaskKind::Repeating => {
                if self.state == TaskState::Executing {
                    self.state = match paused_since {
                        Some(since) => TaskState::Paused { since },
                        None => TaskState::Pending,
                    };
                }
                self.callback = callback;
                None
            }
        }
    }

    pub(crate) fn pause(&mut self, at: Timestamp) -> bool {
        if self.state != TaskState::Pending {
            return false;
        }
        self.state = TaskState::Paused { since: at };
        true
    }

    /// Leave `Paused`, pushing the schedule back by the time spent paused.
    pub(crate) fn resume(&mut self, at: Timestamp) -> bool {
        let TaskState::Paused { since } = self.state else {
            return false;
        };
        self.next_fire_at += at - since;
        self.state = TaskState::Pending;
        true
    }

    pub(crate) fn disable(&mut self) -> bool {
        match self.state {
            TaskState::Disabled | TaskState::Done => false,
            _ => {
                self.state = TaskState::Disabled;
                true
            }
        }
    }

    /// Start a fresh full period from `now`. Enabling is not resuming: the
    /// previous schedule is dropped.
    pub(crate) fn enable(&mut self, now: Timestamp, globally_paused: bool) -> bool {
        if self.state != TaskState::Disabled {
            return false;
        }
        self.next_fire_at = now + self.period;
        self.state = if globally_paused {
            TaskState::Paused { since: now }
        } else {
            TaskState::Pending
        };
        true
    }

    pub(crate) fn restart(&mut self, now: Timestamp, globally_paused: bool) -> bool {
        if self.state.is_done() {
            return false;
        }
        self.state = TaskState::Disabled;
        self.enable(now, globally_paused)
    }

    /// Move to `Done` for good and give up the callback so whatever it
    /// captured can be dropped by the caller, outside of any lock.
    pub(crate) fn destroy(&mut self) -> Callback {
        self.state = TaskState::Done;
        mem::replace(&mut self.callback, noop())
    }
}

impl fmt::Debug for TimedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedTask")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("period", &self.period)
            .field("next_fire_at", &self.next_fire_at)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
