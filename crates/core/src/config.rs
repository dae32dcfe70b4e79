//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. The intent is to avoid reading process-wide environment
//! variables during request handling, which can lead to inconsistent
//! behaviour in multi-threaded runtimes and test harnesses.

use std::time::Duration;

/// Uniform bound applied to every outbound call (record store and model
/// endpoint alike) when no override is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(String);

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    record_store_url: String,
    record_store_key: String,
    request_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        record_store_url: String,
        record_store_key: String,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if record_store_url.trim().is_empty() {
            return Err(ConfigError("record store URL cannot be empty".into()));
        }
        if !record_store_url.starts_with("http://") && !record_store_url.starts_with("https://") {
            return Err(ConfigError(
                "record store URL must be an absolute http(s) URL".into(),
            ));
        }
        if record_store_key.trim().is_empty() {
            return Err(ConfigError("record store service key cannot be empty".into()));
        }
        if request_timeout.is_zero() {
            return Err(ConfigError("request timeout must be non-zero".into()));
        }

        Ok(Self {
            record_store_url,
            record_store_key,
            request_timeout,
        })
    }

    pub fn record_store_url(&self) -> &str {
        &self.record_store_url
    }

    pub fn record_store_key(&self) -> &str {
        &self.record_store_key
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Parse the outbound request timeout from an optional string value
/// (seconds).
///
/// If `value` is `None` or empty/whitespace, returns the default bound.
pub fn request_timeout_from_env_value(value: Option<String>) -> Result<Duration, ConfigError> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_REQUEST_TIMEOUT),
        Some(raw) => {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError(format!("timeout must be whole seconds, got '{raw}'")))?;
            if secs == 0 {
                return Err(ConfigError("timeout must be non-zero".into()));
            }
            Ok(Duration::from_secs(secs))
        }
    }
}
