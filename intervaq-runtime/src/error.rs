//! Error types for the engine.

use thiserror::Error;

use crate::task::TaskId;

/// Error a task callback may hand back to the caller of `poll`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias using the engine's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Period or delay that is zero, negative, NaN or infinite.
    #[error("Invalid duration: {value} (must be positive and finite)")]
    InvalidDuration { value: f64 },

    #[error("Invalid period expression: {0}")]
    InvalidPeriodExpr(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The callback of `task` returned an error. The task has still been
    /// rescheduled (repeating) or evicted (one-shot).
    #[error("Callback of task {task} failed: {source}")]
    Callback { task: TaskId, source: BoxError },
}

impl Error {
    pub(crate) fn check_duration(value: f64) -> Result<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Error::InvalidDuration { value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_duration() {
        assert_eq!(Error::check_duration(16.0).ok(), Some(16.0));
        assert!(matches!(
            Error::check_duration(0.0),
            Err(Error::InvalidDuration { .. })
        ));
        assert!(Error::check_duration(-5.0).is_err());
        assert!(Error::check_duration(f64::NAN).is_err());
        assert!(Error::check_duration(f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDuration { value: -1.0 };
        assert!(err.to_string().contains("-1"));

        let err = Error::Callback {
            task: TaskId::new(7),
            source: "boom".into(),
        };
        assert!(err.to_string().contains("#7"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: Error = config::ConfigError::NotFound("scheduler.tick_rate".into()).into();
        assert!(matches!(err, Error::Config(_)));
    }
}
