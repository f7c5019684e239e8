//! Intervaq Runtime - Core engine for pausable intervals and timeouts
//!
//! This crate provides the task registry, the per-task state machine and the
//! global pause/resume that shifts every schedule by the exact time spent
//! paused. It never reads a clock while polling: the driver passes the
//! current timestamp to [`Scheduler::poll`].

mod clock;
mod config;
mod error;
mod registry;
mod scheduler;
mod sync;
mod task;
mod time_unit;

// Re-export public API
pub use crate::config::{
    load_toml_config, load_yaml_config, parse_period, resolve_config_value, SchedulerSettings,
};
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use error::{BoxError, Error, Result};
pub use registry::GlobalState;
pub use scheduler::{Scheduler, SchedulerBuilder};
pub use task::{IntoTaskResult, TaskHandle, TaskId, TaskKind, TaskResult, TaskState};
pub use time_unit::TimeUnit;

// Make the config crate available to callers building their own `Config`
pub use ::config as config_rs;
