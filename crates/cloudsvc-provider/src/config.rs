use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::waiter::PollPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Load(String),

    #[error("config deserialize error: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.api.url)
            .map_err(|e| ConfigError::invalid(format!("api.url {:?}: {e}", self.api.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("api.url must use http or https"));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("api.request_timeout_secs must be > 0"));
        }
        if self.timeouts.create_secs == 0 || self.timeouts.update_secs == 0 {
            return Err(ConfigError::invalid("timeouts must be > 0"));
        }
        if self.polling.initial_interval_ms == 0 {
            return Err(ConfigError::invalid("polling.initial_interval_ms must be > 0"));
        }
        if self.polling.max_interval_ms < self.polling.initial_interval_ms {
            return Err(ConfigError::invalid(
                "polling.max_interval_ms must be >= polling.initial_interval_ms",
            ));
        }
        if !(self.polling.backoff_factor.is_finite() && self.polling.backoff_factor >= 1.0) {
            return Err(ConfigError::invalid("polling.backoff_factor must be >= 1.0"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub url: String,
    /// API token. Prefer `CLOUDSVC__API__TOKEN` over writing it to a file.
    #[serde(default)]
    pub token: Option<Secret>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.aiven.io".into()
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_operation_timeout_secs")]
    pub create_secs: u64,
    #[serde(default = "default_operation_timeout_secs")]
    pub update_secs: u64,
}

fn default_operation_timeout_secs() -> u64 {
    20 * 60
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            create_secs: default_operation_timeout_secs(),
            update_secs: default_operation_timeout_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Consecutive not-found observations tolerated while waiting.
    #[serde(default = "default_not_found_checks")]
    pub not_found_checks: u32,
}

fn default_initial_interval_ms() -> u64 {
    5_000
}
fn default_max_interval_ms() -> u64 {
    30_000
}
fn default_backoff_factor() -> f64 {
    1.5
}
fn default_not_found_checks() -> u32 {
    20
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            backoff_factor: default_backoff_factor(),
            not_found_checks: default_not_found_checks(),
        }
    }
}

impl PollingConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
            backoff_factor: self.backoff_factor,
            not_found_checks: self.not_found_checks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A credential that never shows up in `Debug`, `Display` or serialized output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl Serialize for Secret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("<redacted>")
    }
}

pub mod loader {
    use super::{ConfigError, ProviderConfig};
    use config::{Config, Environment, File};
    use std::path::Path;

    /// Loads and validates the provider configuration.
    ///
    /// The TOML file at `path` is optional; environment variables such as
    /// `CLOUDSVC__API__URL` or `CLOUDSVC__POLLING__INITIAL_INTERVAL_MS`
    /// override it.
    pub fn load_config(path: Option<&Path>) -> Result<ProviderConfig, ConfigError> {
        let merged = read_config(path)?;
        merged.validate()?;
        Ok(merged)
    }

    /// Merges file and environment sources without validating the result.
    ///
    /// For callers that apply further overrides; they must call
    /// [`ProviderConfig::validate`] themselves.
    pub fn read_config(path: Option<&Path>) -> Result<ProviderConfig, ConfigError> {
        let mut builder = Config::builder();
        let path = path.unwrap_or_else(|| Path::new("cloudsvc.toml"));
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("CLOUDSVC")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        cfg.try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ProviderConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.timeouts.create(), Duration::from_secs(1200));
        assert_eq!(cfg.polling.policy().not_found_checks, 20);
    }

    #[test]
    fn test_partial_document_uses_field_defaults() {
        let cfg: ProviderConfig = serde_json::from_str(
            r#"{ "api": { "token": "tok" }, "polling": { "initial_interval_ms": 100 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.api.url, "https://api.aiven.io");
        assert_eq!(cfg.api.token.as_ref().map(Secret::expose), Some("tok"));
        assert_eq!(cfg.polling.initial_interval_ms, 100);
        assert_eq!(cfg.polling.max_interval_ms, 30_000);
    }

    #[test]
    fn test_validation_failures() {
        let mut cfg = ProviderConfig::default();
        cfg.polling.backoff_factor = 0.5;
        assert!(cfg.validate().is_err());

        let mut cfg = ProviderConfig::default();
        cfg.polling.max_interval_ms = 10;
        assert!(cfg.validate().is_err());

        let mut cfg = ProviderConfig::default();
        cfg.api.url = "ftp://files.example.com".into();
        assert!(cfg.validate().is_err());

        let mut cfg = ProviderConfig::default();
        cfg.timeouts.update_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
        assert_eq!(secret.to_string(), "<redacted>");
        assert_eq!(serde_json::to_value(&secret).unwrap(), "<redacted>");
        assert_eq!(secret.expose(), "hunter2");
    }
}
