use super::scheduler::Scheduler;
use crate::clock::{Clock, MonotonicClock};
use crate::config::{load_toml_config, load_yaml_config, SchedulerSettings};
use crate::error::Result;
use config::Config;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builder for the scheduler
pub struct SchedulerBuilder {
    config: Arc<Config>,
    clock: Option<Arc<dyn Clock>>,
    start_paused: Option<bool>,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default config (empty)
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create with TOML config file
    pub fn with_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_config(load_toml_config(path)?))
    }

    /// Create with YAML config file
    pub fn with_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_config(load_yaml_config(path)?))
    }

    /// Create with custom config
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            clock: None,
            start_paused: None,
        }
    }

    /// Timestamp source used at creation, enable and pause/resume time.
    /// Defaults to a [`MonotonicClock`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use intervaq_runtime::{ManualClock, SchedulerBuilder};
    ///
    /// let clock = ManualClock::new(0.0);
    /// let scheduler = SchedulerBuilder::new().clock(clock.clone()).build()?;
    /// clock.advance(25.0);
    /// assert_eq!(scheduler.now(), 25.0);
    /// # Ok::<(), intervaq_runtime::Error>(())
    /// ```
    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Build the scheduler already paused, overriding `scheduler.start_paused`
    /// from the config.
    pub fn start_paused(mut self, paused: bool) -> Self {
        self.start_paused = Some(paused);
        self
    }

    /// Build the scheduler
    ///
    /// Fails if the `[scheduler]` table of the config cannot be read.
    pub fn build(self) -> Result<Scheduler> {
        let mut settings = SchedulerSettings::from_config(&self.config)?;
        if let Some(paused) = self.start_paused {
            settings.start_paused = paused;
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        info!(
            start_paused = settings.start_paused,
            tick_rate = %settings.tick_rate,
            "Building scheduler"
        );

        Ok(Scheduler::from_parts(clock, self.config, settings))
    }
}
