//! Fixed-rate tokio driver for a [`Scheduler`].

use std::time::Duration;

use intervaq_runtime::{parse_period, Clock, Result, Scheduler, Timestamp};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Clock on tokio's timeline, so a paused tokio test clock pauses it too.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_micros() as f64 / 1000.0
    }
}

/// Polls a scheduler at a fixed rate from a tokio task.
pub struct Ticker {
    scheduler: Scheduler,
    rate: Duration,
}

impl Ticker {
    pub fn new(scheduler: Scheduler, rate: Duration) -> Self {
        Self { scheduler, rate }
    }

    /// Use the `scheduler.tick_rate` setting (default `16ms`).
    pub fn from_config(scheduler: Scheduler) -> Result<Self> {
        let millis = parse_period(&scheduler.settings().tick_rate, scheduler.config())?;
        let rate = Duration::from_micros(((millis * 1000.0).round() as u64).max(1));
        Ok(Self::new(scheduler, rate))
    }

    pub fn rate(&self) -> Duration {
        self.rate
    }

    /// Start polling. Must be called from within a tokio runtime.
    ///
    /// A failing callback is logged and polling goes on; a panicking one
    /// ends the loop.
    pub fn spawn(self) -> TickerHandle {
        let Ticker { scheduler, rate } = self;
        debug!(rate_ms = rate.as_secs_f64() * 1000.0, "Starting ticker");

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(rate);
            // A stalled driver fires once on wake-up, like a late poll
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                if let Err(e) = scheduler.poll_now() {
                    warn!(error = %e, "Task callback failed");
                }
            }
        });

        TickerHandle { handle }
    }
}

/// Handle for a running ticker
/// Used to stop polling
pub struct TickerHandle {
    handle: JoinHandle<()>,
}

impl TickerHandle {
    /// Whether the polling loop has ended (after `shutdown` or a panic).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop polling and wait for the loop to wind down
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
        debug!("Ticker stopped");
    }
}
