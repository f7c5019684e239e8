use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

use crate::clock::Timestamp;
use crate::error::{Error, Result};
use crate::time_unit::TimeUnit;

const DEFAULT_TICK_RATE: &str = "16ms";

/// Load config from a specific TOML file
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = Config::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .add_source(config::Environment::with_prefix("APP").separator("_"))
        .build()?;
    Ok(config)
}

/// Load config from a specific YAML file
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = Config::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
        .add_source(config::Environment::with_prefix("APP").separator("_"))
        .build()?;
    Ok(config)
}

/// Resolve config placeholder like ${app.interval} or ${app.interval:default}
pub fn resolve_config_value(value: &str, config: &Config) -> Result<String> {
    let Some(inner) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Ok(value.to_string());
    };

    // ${app.interval:10s} falls back to the part after the colon
    if let Some((key, default_value)) = inner.split_once(':') {
        match config.get_string(key) {
            Ok(resolved) => Ok(resolved),
            Err(_) => Ok(default_value.to_string()),
        }
    } else {
        Ok(config.get_string(inner)?)
    }
}

/// Turn a period expression into milliseconds.
///
/// Accepts shorthand ("250ms", "2s", "1.5m"), a plain number of
/// milliseconds, or a placeholder resolving to either.
pub fn parse_period(expr: &str, config: &Config) -> Result<Timestamp> {
    let resolved = resolve_config_value(expr, config)?;

    let millis = if let Some((value, unit)) = TimeUnit::parse_duration(&resolved) {
        unit.to_millis(value)
    } else {
        resolved
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidPeriodExpr(resolved.clone()))?
    };

    Error::check_duration(millis)
}

/// Settings read from the `[scheduler]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchedulerSettings {
    /// Build the scheduler already globally paused.
    #[serde(default)]
    pub start_paused: bool,
    /// Poll rate used by fixed-rate drivers, as a period expression.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: String,
}

fn default_tick_rate() -> String {
    DEFAULT_TICK_RATE.to_string()
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            start_paused: false,
            tick_rate: default_tick_rate(),
        }
    }
}

impl SchedulerSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.get::<SchedulerSettings>("scheduler") {
            Ok(settings) => Ok(settings),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml(source: &str) -> Config {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_literal_and_placeholder() {
        let config = toml("[app]\nheartbeat = \"750ms\"\n");

        assert_eq!(resolve_config_value("2s", &config).unwrap(), "2s");
        assert_eq!(
            resolve_config_value("${app.heartbeat}", &config).unwrap(),
            "750ms"
        );
        assert_eq!(
            resolve_config_value("${app.missing:1s}", &config).unwrap(),
            "1s"
        );
        assert!(resolve_config_value("${app.missing}", &config).is_err());
    }

    #[test]
    fn test_parse_period() {
        let config = toml("[app]\nblink = 250\nfade = \"1.5s\"\n");

        assert_eq!(parse_period("40", &config).unwrap(), 40.0);
        assert_eq!(parse_period("2m", &config).unwrap(), 120_000.0);
        assert_eq!(parse_period("${app.blink}", &config).unwrap(), 250.0);
        assert_eq!(parse_period("${app.fade}", &config).unwrap(), 1500.0);
        assert_eq!(parse_period("${app.other:10ms}", &config).unwrap(), 10.0);
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        let config = Config::default();

        assert!(matches!(
            parse_period("soon", &config),
            Err(Error::InvalidPeriodExpr(_))
        ));
        assert!(matches!(
            parse_period("0ms", &config),
            Err(Error::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_period("-3", &config),
            Err(Error::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_settings_default_when_table_missing() {
        let settings = SchedulerSettings::from_config(&Config::default()).unwrap();
        assert_eq!(settings, SchedulerSettings::default());
        assert_eq!(settings.tick_rate, "16ms");
    }

    #[test]
    fn test_settings_from_table() {
        let config = toml("[scheduler]\nstart_paused = true\n");
        let settings = SchedulerSettings::from_config(&config).unwrap();
        assert!(settings.start_paused);
        assert_eq!(settings.tick_rate, "16ms");

        let config = toml("[scheduler]\ntick_rate = \"5ms\"\n");
        let settings = SchedulerSettings::from_config(&config).unwrap();
        assert!(!settings.start_paused);
        assert_eq!(settings.tick_rate, "5ms");
    }

    #[test]
    fn test_load_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "intervaq-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[scheduler]\ntick_rate = \"8ms\"\n").unwrap();

        let config = load_toml_config(&path).unwrap();
        assert_eq!(config.get_string("scheduler.tick_rate").unwrap(), "8ms");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_yaml_file() {
        let path = std::env::temp_dir().join(format!(
            "intervaq-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "scheduler:\n  tick_rate: \"5ms\"\n  start_paused: true\napp:\n  blink: \"1.5s\"\n",
        )
        .unwrap();

        let config = load_yaml_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.get_string("scheduler.tick_rate").unwrap(), "5ms");
        assert_eq!(parse_period("${app.blink}", &config).unwrap(), 1_500.0);

        let settings = SchedulerSettings::from_config(&config).unwrap();
        assert!(settings.start_paused);
        assert_eq!(settings.tick_rate, "5ms");
    }
}
