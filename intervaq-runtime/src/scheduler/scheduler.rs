use super::builder::SchedulerBuilder;
use crate::clock::{Clock, MonotonicClock, Timestamp};
use crate::config::{parse_period, SchedulerSettings};
use crate::error::{Error, Result};
use crate::registry::{Entry, GlobalState, Registry};
use crate::sync::lock;
use crate::task::{boxed, noop, Callback, IntoTaskResult, TaskHandle, TaskKind, TimedTask};
use config::Config;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// State shared between a scheduler, its clones and its task handles.
pub(crate) struct Shared {
    pub(crate) registry: Mutex<Registry>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: Arc<Config>,
    pub(crate) settings: SchedulerSettings,
}

/// Registry of intervals and timeouts driven by an external timestamp.
///
/// Cloning gives another handle to the same registry, which is how a task
/// callback can cancel tasks, create new ones, or pause everything while
/// `poll` is running. A callback that captures its own scheduler keeps it
/// alive until that task is cancelled or evicted.
///
/// ```rust
/// use intervaq_runtime::{ManualClock, Scheduler};
///
/// let clock = ManualClock::new(0.0);
/// let scheduler = Scheduler::with_clock(clock.clone());
/// let blink = scheduler.create_repeating(|| println!("blink"), 50.0)?;
///
/// assert_eq!(scheduler.poll(49.0)?, 0);
/// assert_eq!(scheduler.poll(50.0)?, 1);
/// assert_eq!(blink.next_fire_at(), 100.0);
/// # Ok::<(), intervaq_runtime::Error>(())
/// ```
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Scheduler on a [`MonotonicClock`] with default settings.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }

    pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
        Self::from_parts(
            Arc::new(clock),
            Arc::new(Config::default()),
            SchedulerSettings::default(),
        )
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(
        clock: Arc<dyn Clock>,
        config: Arc<Config>,
        settings: SchedulerSettings,
    ) -> Self {
        let state = if settings.start_paused {
            GlobalState::Paused { since: clock.now() }
        } else {
            GlobalState::Running
        };

        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::new(state)),
                clock,
                config,
                settings,
            }),
        }
    }

    /// Current reading of the scheduler's clock, suitable for `poll`.
    pub fn now(&self) -> Timestamp {
        self.shared.clock.now()
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.shared.settings
    }

    /// Register a callback firing every `period` milliseconds.
    pub fn create_repeating<F, R>(&self, callback: F, period: Timestamp) -> Result<TaskHandle>
    where
        F: FnMut() -> R + Send + 'static,
        R: IntoTaskResult,
    {
        self.create(TaskKind::Repeating, boxed(callback), period)
    }

    /// Register a callback firing once, `delay` milliseconds from now.
    pub fn create_one_shot<F, R>(&self, callback: F, delay: Timestamp) -> Result<TaskHandle>
    where
        F: FnMut() -> R + Send + 'static,
        R: IntoTaskResult,
    {
        self.create(TaskKind::OneShot, boxed(callback), delay)
    }

    /// Like [`create_repeating`](Self::create_repeating) with the period
    /// given as an expression such as `"250ms"` or `"${app.blink:1s}"`.
    pub fn create_repeating_from<F, R>(&self, callback: F, period: &str) -> Result<TaskHandle>
    where
        F: FnMut() -> R + Send + 'static,
        R: IntoTaskResult,
    {
        let period = parse_period(period, &self.shared.config)?;
        self.create(TaskKind::Repeating, boxed(callback), period)
    }

    pub fn create_one_shot_from<F, R>(&self, callback: F, delay: &str) -> Result<TaskHandle>
    where
        F: FnMut() -> R + Send + 'static,
        R: IntoTaskResult,
    {
        let delay = parse_period(delay, &self.shared.config)?;
        self.create(TaskKind::OneShot, boxed(callback), delay)
    }

    fn create(&self, kind: TaskKind, callback: Callback, period: Timestamp) -> Result<TaskHandle> {
        let period = Error::check_duration(period)?;

        let mut registry = lock(&self.shared.registry);
        let id = registry.next_id();
        let now = self.shared.clock.now();
        let paused = registry.paused_since().is_some();

        let task = Arc::new(Mutex::new(TimedTask::new(
            id, kind, callback, period, now, paused,
        )));
        registry.insert(Entry {
            id,
            kind,
            task: task.clone(),
        });

        debug!(task = %id, ?kind, period, paused, "Registered task");
        Ok(TaskHandle::new(id, kind, task, Arc::downgrade(&self.shared)))
    }

    /// Remove and destroy a task.
    ///
    /// Returns `true` the first time for a registered task and `false` on
    /// every later call, or for a handle from another scheduler. Once this
    /// returns `true` the callback never runs again.
    pub fn cancel(&self, handle: &TaskHandle) -> bool {
        if !handle.is_owned_by(&self.shared) {
            return false;
        }

        let mut registry = lock(&self.shared.registry);
        let Some(entry) = registry.remove(handle.id(), handle.kind()) else {
            return false;
        };
        let released = lock(&entry.task).destroy();
        drop(registry);
        // dropped outside the locks, the callback may own anything
        drop(released);

        debug!(task = %handle.id(), "Cancelled task");
        true
    }

    /// Cancel every task. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut registry = lock(&self.shared.registry);
        let released: Vec<Callback> = registry
            .drain()
            .iter()
            .map(|entry| lock(&entry.task).destroy())
            .collect();
        drop(registry);

        let count = released.len();
        drop(released);
        debug!(tasks = count, "Cleared scheduler");
        count
    }

    /// Fire every task due at `now` and return how many fired.
    ///
    /// Does nothing while the scheduler is paused. Repeating tasks are
    /// checked before one-shot tasks, each in creation order, and each task
    /// fires at most once per call however far `now` is past its deadline.
    /// Tasks created by a callback are first checked on the next call.
    ///
    /// A callback error stops the pass and is returned as
    /// [`Error::Callback`]; the failing task still counts as fired. A
    /// panicking callback unwinds through `poll` after its task has been
    /// rescheduled or evicted.
    pub fn poll(&self, now: Timestamp) -> Result<usize> {
        let (repeating, one_shot) = {
            let registry = lock(&self.shared.registry);
            if registry.paused_since().is_some() {
                return Ok(0);
            }
            (registry.repeating.clone(), registry.one_shot.clone())
        };

        let mut fired = 0;
        for entry in repeating.iter().chain(one_shot.iter()) {
            if self.check_time_to_execute(entry, now)? {
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// [`poll`](Self::poll) with the scheduler's own clock.
    pub fn poll_now(&self) -> Result<usize> {
        self.poll(self.now())
    }

    fn check_time_to_execute(&self, entry: &Entry, now: Timestamp) -> Result<bool> {
        let Some(callback) = lock(&entry.task).begin_fire(now) else {
            return Ok(false);
        };
        trace!(task = %entry.id, now, "Firing task");

        let mut guard = FireGuard {
            shared: &self.shared,
            entry,
            callback,
        };
        let outcome = (guard.callback)();
        drop(guard);

        outcome
            .map(|()| true)
            .map_err(|source| Error::Callback {
                task: entry.id,
                source,
            })
    }

    /// Pause every task, using the scheduler's clock.
    pub fn pause_all(&self) -> bool {
        self.pause_all_at(self.now())
    }

    /// Freeze every pending task at `now`. Disabled and done tasks are left
    /// alone. Returns `false` if the scheduler was already paused.
    pub fn pause_all_at(&self, now: Timestamp) -> bool {
        let mut registry = lock(&self.shared.registry);
        if registry.paused_since().is_some() {
            return false;
        }

        registry.state = GlobalState::Paused { since: now };
        let paused = registry
            .entries()
            .filter(|entry| lock(&entry.task).pause(now))
            .count();

        debug!(at = now, tasks = paused, "Paused scheduler");
        true
    }

    /// Resume every paused task, using the scheduler's clock.
    pub fn resume_all(&self) -> bool {
        self.resume_all_at(self.now())
    }

    /// Unfreeze every paused task, shifting its schedule by the time it
    /// spent paused, then let `poll` run again. Returns `false` if the
    /// scheduler was not paused.
    pub fn resume_all_at(&self, now: Timestamp) -> bool {
        let mut registry = lock(&self.shared.registry);
        let Some(since) = registry.paused_since() else {
            return false;
        };

        let resumed = registry
            .entries()
            .filter(|entry| lock(&entry.task).resume(now))
            .count();
        registry.state = GlobalState::Running;

        debug!(at = now, paused_for = now - since, tasks = resumed, "Resumed scheduler");
        true
    }

    pub fn state(&self) -> GlobalState {
        lock(&self.shared.registry).state
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at().is_some()
    }

    pub fn paused_at(&self) -> Option<Timestamp> {
        lock(&self.shared.registry).paused_since()
    }

    /// Handles to the registered repeating tasks, in creation order.
    pub fn repeating_tasks(&self) -> Vec<TaskHandle> {
        let registry = lock(&self.shared.registry);
        registry.repeating.iter().map(|e| self.handle(e)).collect()
    }

    /// Handles to the registered one-shot tasks, in creation order.
    pub fn one_shot_tasks(&self) -> Vec<TaskHandle> {
        let registry = lock(&self.shared.registry);
        registry.one_shot.iter().map(|e| self.handle(e)).collect()
    }

    pub fn contains(&self, handle: &TaskHandle) -> bool {
        handle.is_owned_by(&self.shared)
            && lock(&self.shared.registry).contains(handle.id(), handle.kind())
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.registry).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, entry: &Entry) -> TaskHandle {
        TaskHandle::new(
            entry.id,
            entry.kind,
            entry.task.clone(),
            Arc::downgrade(&self.shared),
        )
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = lock(&self.shared.registry);
        f.debug_struct("Scheduler")
            .field("state", &registry.state)
            .field("repeating", &registry.repeating.len())
            .field("one_shot", &registry.one_shot.len())
            .finish()
    }
}

/// Finishes a fire even if the callback panics: reschedules or evicts the
/// task and puts its callback back.
struct FireGuard<'a> {
    shared: &'a Shared,
    entry: &'a Entry,
    callback: Callback,
}

impl Drop for FireGuard<'_> {
    fn drop(&mut self) {
        let callback = mem::replace(&mut self.callback, noop());

        let mut registry = lock(&self.shared.registry);
        let paused_since = registry.paused_since();
        let released = lock(&self.entry.task).finish_fire(callback, paused_since);
        if self.entry.kind == TaskKind::OneShot
            && registry.remove(self.entry.id, TaskKind::OneShot).is_some()
        {
            debug!(task = %self.entry.id, "Evicted one-shot task");
        }
        drop(registry);
        drop(released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::task::TaskState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let inner = hits.clone();
        (hits, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn scheduler_at(start: Timestamp) -> (Scheduler, ManualClock) {
        let clock = ManualClock::new(start);
        (Scheduler::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_repeating_scenario_period_50() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let (hits, callback) = counter();
        let task = scheduler.create_repeating(callback, 50.0).unwrap();

        assert_eq!(scheduler.poll(49.0).unwrap(), 0);
        assert_eq!(scheduler.poll(50.0).unwrap(), 1);
        assert_eq!(task.next_fire_at(), 100.0);
        assert_eq!(scheduler.poll(100.0).unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let (scheduler, _clock) = scheduler_at(0.0);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                scheduler.create_repeating(|| {}, bad),
                Err(Error::InvalidDuration { .. })
            ));
            assert!(matches!(
                scheduler.create_one_shot(|| {}, bad),
                Err(Error::InvalidDuration { .. })
            ));
        }
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_at_most_once_per_poll() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let (hits, callback) = counter();
        let task = scheduler.create_repeating(callback, 10.0).unwrap();

        assert_eq!(scheduler.poll(10_000.0).unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(task.next_fire_at(), 10_010.0);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let (hits, callback) = counter();
        let task = scheduler.create_repeating(callback, 10.0).unwrap();

        assert!(scheduler.cancel(&task));
        assert!(!scheduler.cancel(&task));
        assert!(!scheduler.cancel(&task));
        assert_eq!(task.state(), TaskState::Done);
        assert!(!task.is_registered());

        // a destroyed task keeps its numbers readable but stays inert
        assert_eq!(task.period(), 10.0);
        assert_eq!(task.next_fire_at(), 10.0);
        assert_eq!(task.fire_count(), 0);
        assert_eq!(task.paused_at(), None);
        assert!(!task.disable());
        assert!(!task.enable());
        assert!(!task.restart());
        assert!(!task.pause());

        scheduler.poll(100.0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(task.state(), TaskState::Done);
    }

    #[test]
    fn test_cancel_rejects_foreign_handle() {
        let (first, _) = scheduler_at(0.0);
        let (second, _) = scheduler_at(0.0);
        let task = first.create_one_shot(|| {}, 5.0).unwrap();

        assert!(!second.cancel(&task));
        assert!(!second.contains(&task));
        assert!(first.contains(&task));
    }

    #[test]
    fn test_one_shot_is_evicted_after_firing() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let (hits, callback) = counter();
        let task = scheduler.create_one_shot(callback, 30.0).unwrap();

        assert_eq!(scheduler.poll(29.0).unwrap(), 0);
        assert!(scheduler.contains(&task));
        assert_eq!(scheduler.poll(31.0).unwrap(), 1);
        assert!(!scheduler.contains(&task));
        assert_eq!(task.state(), TaskState::Done);
        assert_eq!(scheduler.poll(500.0).unwrap(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!scheduler.cancel(&task));
    }

    #[test]
    fn test_pause_window_shifts_next_fire() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let task = scheduler.create_repeating(|| {}, 100.0).unwrap();
        let before = task.next_fire_at();

        assert!(scheduler.pause_all_at(10.0));
        assert_eq!(task.paused_at(), Some(10.0));
        assert!(scheduler.resume_all_at(40.0));

        assert_eq!(task.next_fire_at(), before + 30.0);
        assert_eq!(task.paused_at(), None);
        assert_eq!(task.state(), TaskState::Pending);
    }

    #[test]
    fn test_pause_resume_are_idempotent() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let task = scheduler.create_repeating(|| {}, 100.0).unwrap();

        assert!(!scheduler.resume_all_at(5.0));
        assert!(scheduler.pause_all_at(10.0));
        assert!(!scheduler.pause_all_at(20.0));
        assert_eq!(scheduler.paused_at(), Some(10.0));
        assert!(scheduler.resume_all_at(30.0));
        assert!(!scheduler.resume_all_at(40.0));
        assert_eq!(task.next_fire_at(), 120.0);
    }

    #[test]
    fn test_poll_is_noop_while_paused() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let (hits, callback) = counter();
        scheduler.create_one_shot(callback, 10.0).unwrap();

        scheduler.pause_all_at(5.0);
        assert_eq!(scheduler.poll(1_000.0).unwrap(), 0);
        scheduler.resume_all_at(1_000.0);

        // 5ms were left when paused
        assert_eq!(scheduler.poll(1_004.0).unwrap(), 0);
        assert_eq!(scheduler.poll(1_005.0).unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pause_leaves_inert_tasks_alone() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let disabled = scheduler.create_repeating(|| {}, 10.0).unwrap();
        disabled.disable();

        scheduler.pause_all_at(5.0);
        assert_eq!(disabled.state(), TaskState::Disabled);
        scheduler.resume_all_at(9.0);
        assert_eq!(disabled.state(), TaskState::Disabled);
    }

    #[test]
    fn test_task_created_while_paused_starts_paused() {
        let (scheduler, clock) = scheduler_at(0.0);
        scheduler.pause_all_at(0.0);

        clock.set(100.0);
        let (hits, callback) = counter();
        let task = scheduler.create_one_shot(callback, 50.0).unwrap();
        assert_eq!(task.state(), TaskState::Paused { since: 100.0 });

        clock.set(1_000.0);
        scheduler.resume_all_at(1_000.0);
        assert_eq!(task.next_fire_at(), 1_050.0);
        assert_eq!(scheduler.poll(1_000.0).unwrap(), 0);
        assert_eq!(scheduler.poll(1_050.0).unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_firing_order() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let order = Arc::new(Mutex::new(Vec::new()));

        for (name, one_shot) in [("once-a", true), ("every-a", false), ("once-b", true), ("every-b", false)] {
            let order = order.clone();
            let callback = move || lock(&order).push(name);
            if one_shot {
                scheduler.create_one_shot(callback, 10.0).unwrap();
            } else {
                scheduler.create_repeating(callback, 10.0).unwrap();
            }
        }

        assert_eq!(scheduler.poll(10.0).unwrap(), 4);
        assert_eq!(*lock(&order), vec!["every-a", "every-b", "once-a", "once-b"]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let (hits, callback) = counter();
        let every = scheduler.create_repeating(callback, 10.0).unwrap();
        let once = scheduler.create_one_shot(|| {}, 10.0).unwrap();

        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.clear(), 2);
        assert!(scheduler.is_empty());
        assert!(every.state().is_done());
        assert!(once.state().is_done());
        assert!(!scheduler.cancel(&every));

        scheduler.poll(100.0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_introspection_handles() {
        let (scheduler, _clock) = scheduler_at(0.0);
        let every = scheduler.create_repeating(|| {}, 10.0).unwrap();
        let once = scheduler.create_one_shot(|| {}, 10.0).unwrap();

        assert_eq!(scheduler.repeating_tasks(), vec![every.clone()]);
        assert_eq!(scheduler.one_shot_tasks(), vec![once.clone()]);
        assert_ne!(every, once);
        assert_eq!(every.kind(), TaskKind::Repeating);
        assert_eq!(once.kind(), TaskKind::OneShot);
    }

    #[test]
    fn test_start_paused_setting() {
        let clock = ManualClock::new(7.0);
        let settings = SchedulerSettings {
            start_paused: true,
            ..SchedulerSettings::default()
        };
        let scheduler = Scheduler::from_parts(Arc::new(clock), Arc::new(Config::default()), settings);

        assert_eq!(scheduler.state(), GlobalState::Paused { since: 7.0 });
        let task = scheduler.create_repeating(|| {}, 10.0).unwrap();
        assert_eq!(task.paused_at(), Some(7.0));
    }
}
