use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::sync::lock;

/// Milliseconds on the driving clock's timeline.
pub type Timestamp = f64;

/// Source of timestamps for the engine.
///
/// The scheduler only reads its clock when a task is created, enabled or
/// restarted, and when pausing or resuming without an explicit timestamp.
/// `poll` always takes the current time as an argument.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock counting milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_micros() as f64 / 1000.0
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one copy and hand the
/// other to a scheduler.
///
/// ```rust
/// use intervaq_runtime::{Clock, ManualClock};
///
/// let clock = ManualClock::new(10.0);
/// let shared = clock.clone();
/// clock.advance(5.0);
/// assert_eq!(shared.now(), 15.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *lock(&self.now) = now;
    }

    /// Move the clock forward and return the new reading.
    pub fn advance(&self, delta: Timestamp) -> Timestamp {
        let mut now = lock(&self.now);
        *now += delta;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *lock(&self.now)
    }
}
