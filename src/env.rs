//! Environment variable names used by this crate for convenient
//! configuration from services.
//!
//! These are purely helpers; [`Config`] itself never reads the
//! environment.

use std::time::Duration;

use crate::config::{Config, ConfigError};

/// Instrumentation key of the target resource. Required.
pub const APPINSIGHTS_INSTRUMENTATIONKEY_ENV: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";

/// Optional custom track endpoint.
pub const APPINSIGHTS_ENDPOINT_URL_ENV: &str = "APPINSIGHTS_ENDPOINT_URL";

/// Optional minimum level, e.g. `warn`.
pub const APPINSIGHTS_MIN_LOG_LEVEL_ENV: &str = "APPINSIGHTS_MIN_LOG_LEVEL";

/// Optional batch size override.
pub const APPINSIGHTS_MAX_BATCH_SIZE_ENV: &str = "APPINSIGHTS_MAX_BATCH_SIZE";

/// Optional batch interval override, in milliseconds.
pub const APPINSIGHTS_MAX_BATCH_INTERVAL_MS_ENV: &str = "APPINSIGHTS_MAX_BATCH_INTERVAL_MS";

impl Config {
    /// Load the configuration from the process environment.
    ///
    /// Unset or empty variables keep their defaults. A missing
    /// instrumentation key is only reported later, by
    /// [`Config::telemetry_configuration`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::new(get(APPINSIGHTS_INSTRUMENTATIONKEY_ENV).unwrap_or_default());

        config.endpoint_url = get(APPINSIGHTS_ENDPOINT_URL_ENV);
        if let Some(level) = get(APPINSIGHTS_MIN_LOG_LEVEL_ENV) {
            config.min_log_level = level.parse()?;
        }
        if let Some(size) = get(APPINSIGHTS_MAX_BATCH_SIZE_ENV) {
            config.max_batch_size = parse_number(APPINSIGHTS_MAX_BATCH_SIZE_ENV, &size)?;
        }
        if let Some(ms) = get(APPINSIGHTS_MAX_BATCH_INTERVAL_MS_ENV) {
            config.max_batch_interval =
                Duration::from_millis(parse_number(APPINSIGHTS_MAX_BATCH_INTERVAL_MS_ENV, &ms)?);
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_all_variables() {
        let config = Config::from_lookup(lookup(&[
            (APPINSIGHTS_INSTRUMENTATIONKEY_ENV, "abc"),
            (APPINSIGHTS_ENDPOINT_URL_ENV, "http://localhost:1/v2/track"),
            (APPINSIGHTS_MIN_LOG_LEVEL_ENV, "Warning"),
            (APPINSIGHTS_MAX_BATCH_SIZE_ENV, "50"),
            (APPINSIGHTS_MAX_BATCH_INTERVAL_MS_ENV, "1500"),
        ]))
        .unwrap();

        assert_eq!(config.instrumentation_key, "abc");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:1/v2/track"));
        assert_eq!(config.min_log_level, LogLevel::Warn);
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.max_batch_interval, Duration::from_millis(1500));
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[(APPINSIGHTS_ENDPOINT_URL_ENV, "  ")])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn bad_values_are_reported() {
        assert_eq!(
            Config::from_lookup(lookup(&[(APPINSIGHTS_MAX_BATCH_SIZE_ENV, "lots")])),
            Err(ConfigError::InvalidValue {
                key: APPINSIGHTS_MAX_BATCH_SIZE_ENV,
                value: "lots".to_string(),
            })
        );
        assert!(matches!(
            Config::from_lookup(lookup(&[(APPINSIGHTS_MIN_LOG_LEVEL_ENV, "shouty")])),
            Err(ConfigError::InvalidLevel(_))
        ));
    }
}
