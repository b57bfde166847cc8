use std::time::Duration;

use crate::level::{LogLevel, ParseLevelError};

/// Default track endpoint of the ingestion service.
pub const DEFAULT_ENDPOINT_URL: &str = "https://dc.services.visualstudio.com/v2/track";
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1024;
pub const DEFAULT_MAX_BATCH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_CHANNEL_BUFFER: usize = 8192;

/// Adapter configuration, created once at startup.
///
/// **Fields**
/// - `instrumentation_key`: identity of the target resource. Required.
/// - `endpoint_url`: custom track endpoint; `None` or empty keeps the
///   default.
/// - `min_log_level`: least severe level that is forwarded. Defaults to
///   [`LogLevel::Debug`], i.e. everything.
/// - `max_batch_size`, `max_batch_interval`, `channel_buffer`: client
///   overrides; `0` keeps the client default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub instrumentation_key: String,
    pub endpoint_url: Option<String>,
    pub min_log_level: LogLevel,
    pub max_batch_size: usize,
    pub max_batch_interval: Duration,
    pub channel_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instrumentation_key: String::new(),
            endpoint_url: None,
            min_log_level: LogLevel::Debug,
            max_batch_size: 0,
            max_batch_interval: Duration::ZERO,
            channel_buffer: 0,
        }
    }
}

impl Config {
    pub fn new(instrumentation_key: impl Into<String>) -> Self {
        Self {
            instrumentation_key: instrumentation_key.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration and derive the client settings from it.
    pub fn telemetry_configuration(&self) -> Result<TelemetryConfiguration, ConfigError> {
        if self.instrumentation_key.is_empty() {
            return Err(ConfigError::MissingInstrumentationKey);
        }

        let mut telemetry = TelemetryConfiguration::new(self.instrumentation_key.clone());
        if self.max_batch_size > 0 {
            telemetry.max_batch_size = self.max_batch_size;
        }
        if self.max_batch_interval > Duration::ZERO {
            telemetry.max_batch_interval = self.max_batch_interval;
        }
        if self.channel_buffer > 0 {
            telemetry.channel_buffer = self.channel_buffer;
        }
        if let Some(url) = self.endpoint_url.as_deref().filter(|u| !u.is_empty()) {
            telemetry.endpoint_url = url.to_string();
        }
        Ok(telemetry)
    }
}

/// Settings of the telemetry client and its delivery channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryConfiguration {
    pub instrumentation_key: String,
    pub endpoint_url: String,
    /// Transmit as soon as this many envelopes are buffered.
    pub max_batch_size: usize,
    /// Transmit a non-empty batch at least this often.
    pub max_batch_interval: Duration,
    /// Capacity of the submission queue; envelopes beyond it are dropped.
    pub channel_buffer: usize,
}

impl TelemetryConfiguration {
    pub fn new(instrumentation_key: impl Into<String>) -> Self {
        Self {
            instrumentation_key: instrumentation_key.into(),
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_batch_interval: DEFAULT_MAX_BATCH_INTERVAL,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

/// Error type returned when validating or loading configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("instrumentation key is required and missing from configuration")]
    MissingInstrumentationKey,

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    InvalidLevel(#[from] ParseLevelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(
            Config::default().telemetry_configuration(),
            Err(ConfigError::MissingInstrumentationKey)
        );
    }

    #[test]
    fn blank_key_is_passed_through_unchanged() {
        let telemetry = Config::new("  ").telemetry_configuration().unwrap();
        assert_eq!(telemetry.instrumentation_key, "  ");
    }

    #[test]
    fn unset_overrides_keep_client_defaults() {
        let telemetry = Config::new("key").telemetry_configuration().unwrap();
        assert_eq!(telemetry, TelemetryConfiguration::new("key"));
    }

    #[test]
    fn explicit_overrides_are_applied() {
        let config = Config {
            endpoint_url: Some("http://localhost:9999/v2/track".into()),
            max_batch_size: 10,
            max_batch_interval: Duration::from_millis(250),
            channel_buffer: 64,
            ..Config::new("key")
        };

        let telemetry = config.telemetry_configuration().unwrap();
        assert_eq!(telemetry.endpoint_url, "http://localhost:9999/v2/track");
        assert_eq!(telemetry.max_batch_size, 10);
        assert_eq!(telemetry.max_batch_interval, Duration::from_millis(250));
        assert_eq!(telemetry.channel_buffer, 64);
    }

    #[test]
    fn empty_endpoint_keeps_default() {
        let config = Config {
            endpoint_url: Some(String::new()),
            ..Config::new("key")
        };
        assert_eq!(
            config.telemetry_configuration().unwrap().endpoint_url,
            DEFAULT_ENDPOINT_URL
        );
    }
}
