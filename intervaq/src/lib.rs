//! # Intervaq - Pausable setInterval/setTimeout for Rust
//!
//! Intervals and timeouts that can be paused and resumed without losing the
//! time left until their next fire, driven by whatever timestamp your loop
//! already has: a render frame, a game tick, a tokio interval.
//!
//! ## Features
//!
//! - **Repeating tasks**: fire every period until cancelled or disabled
//! - **One-shot tasks**: fire once, then leave the registry on their own
//! - **Global pause**: freeze every countdown and resume with the exact shift
//! - **External time**: `poll(timestamp)` never reads a clock itself
//! - **Config support**: periods like `"250ms"` or `"${app.blink:1s}"`
//! - **Tokio driver**: a fixed-rate [`Ticker`] for async applications
//!
//! ## Quick Start
//!
//! ```rust
//! use intervaq::{ManualClock, Scheduler};
//!
//! let clock = ManualClock::new(0.0);
//! let scheduler = Scheduler::with_clock(clock.clone());
//!
//! let blink = scheduler.create_repeating(|| println!("blink"), 50.0)?;
//! scheduler.create_one_shot(|| println!("hello once"), 120.0)?;
//!
//! // drive it from your own loop
//! scheduler.poll(50.0)?;
//!
//! // freeze for 30ms: every schedule moves back by exactly 30ms
//! scheduler.pause_all_at(60.0);
//! scheduler.resume_all_at(90.0);
//! assert_eq!(blink.next_fire_at(), 130.0);
//! # Ok::<(), intervaq::Error>(())
//! ```
//!
//! ## With tokio
//!
//! ```rust,no_run
//! use intervaq::{SchedulerBuilder, Ticker, TokioClock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = SchedulerBuilder::with_toml("config/application.toml")?
//!         .clock(TokioClock::new())
//!         .build()?;
//!
//!     scheduler.create_repeating_from(|| println!("tick"), "${app.heartbeat:1s}")?;
//!
//!     let ticker = Ticker::from_config(scheduler.clone())?.spawn();
//!     tokio::signal::ctrl_c().await?;
//!     ticker.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Create `config/application.toml`:
//!
//! ```toml
//! [scheduler]
//! tick_rate = "16ms"
//! start_paused = false
//!
//! [app]
//! heartbeat = "500ms"
//! ```
//!
//! You can also use environment variables with `APP_` prefix:
//!
//! ```bash
//! export APP_APP_HEARTBEAT=2s
//! ```

pub mod ticker;

// Re-export core types
pub use intervaq_runtime::{
    load_toml_config, load_yaml_config, parse_period, resolve_config_value, BoxError, Clock,
    Error, GlobalState, IntoTaskResult, ManualClock, MonotonicClock, Result, Scheduler,
    SchedulerBuilder, SchedulerSettings, TaskHandle, TaskId, TaskKind, TaskResult, TaskState,
    TimeUnit, Timestamp,
};

pub use ticker::{Ticker, TickerHandle, TokioClock};

// Make intervaq_runtime available for callers that need the config crate
pub use intervaq_runtime;
