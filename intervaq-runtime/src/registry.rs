use std::sync::{Arc, Mutex};

use crate::clock::Timestamp;
use crate::task::{TaskId, TaskKind, TimedTask};

pub(crate) type SharedTask = Arc<Mutex<TimedTask>>;

/// Scheduler-wide run state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalState {
    Running,
    Paused { since: Timestamp },
}

/// A registered task as stored by the scheduler.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) id: TaskId,
    pub(crate) kind: TaskKind,
    pub(crate) task: SharedTask,
}

/// Tasks owned by one scheduler, in insertion order per kind.
///
/// Lock order is always registry first, then task.
pub(crate) struct Registry {
    pub(crate) repeating: Vec<Entry>,
    pub(crate) one_shot: Vec<Entry>,
    pub(crate) state: GlobalState,
    next_id: u64,
}

impl Registry {
    pub(crate) fn new(state: GlobalState) -> Self {
        Self {
            repeating: Vec::new(),
            one_shot: Vec::new(),
            state,
            next_id: 1,
        }
    }

    pub(crate) fn next_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn paused_since(&self) -> Option<Timestamp> {
        match self.state {
            GlobalState::Paused { since } => Some(since),
            GlobalState::Running => None,
        }
    }

    pub(crate) fn insert(&mut self, entry: Entry) {
        match entry.kind {
            TaskKind::Repeating => self.repeating.push(entry),
            TaskKind::OneShot => self.one_shot.push(entry),
        }
    }

    pub(crate) fn remove(&mut self, id: TaskId, kind: TaskKind) -> Option<Entry> {
        let list = match kind {
            TaskKind::Repeating => &mut self.repeating,
            TaskKind::OneShot => &mut self.one_shot,
        };
        let index = list.iter().position(|entry| entry.id == id)?;
        Some(list.remove(index))
    }

    pub(crate) fn contains(&self, id: TaskId, kind: TaskKind) -> bool {
        let list = match kind {
            TaskKind::Repeating => &self.repeating,
            TaskKind::OneShot => &self.one_shot,
        };
        list.iter().any(|entry| entry.id == id)
    }

    /// Repeating tasks first, then one-shot ones.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.repeating.iter().chain(self.one_shot.iter())
    }

    pub(crate) fn len(&self) -> usize {
        self.repeating.len() + self.one_shot.len()
    }

    pub(crate) fn drain(&mut self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.repeating.drain(..).collect();
        entries.append(&mut self.one_shot);
        entries
    }
}
