//! Update handler configuration.
//!
//! [`UpdateOptions`] controls how the update handler waits on and retries
//! the cloud API call. It can be built in code or read from the
//! `update` section of the provider configuration:
//!
//! ```
//! use std::time::Duration;
//! use yc_update_mask::config::UpdateOptions;
//!
//! let options = UpdateOptions::from_value(serde_json::json!({
//!     "timeout_secs": 120,
//!     "max_retries": 5,
//! }))
//! .unwrap();
//!
//! assert_eq!(options.timeout, Duration::from_secs(120));
//! assert_eq!(options.max_retries, 5);
//! assert_eq!(options.retry_backoff, UpdateOptions::default().retry_backoff);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::UpdateError;

const DEFAULT_TIMEOUT_SECS: u64 = 20 * 60;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Options for sending update requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Deadline for one API call, including waiting on the operation.
    /// Default: 20 minutes.
    pub timeout: Duration,
    /// Retries after a transient failure. Default: 3.
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt up to 30 seconds.
    /// Default: 500 milliseconds.
    pub retry_backoff: Duration,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl UpdateOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry limit.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial retry delay.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_RETRY_BACKOFF)
            .min(MAX_RETRY_BACKOFF)
    }

    /// Read options from a JSON object. Missing fields keep their defaults;
    /// `null` yields the defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self, UpdateError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let raw: RawUpdateOptions = serde_json::from_value(value)?;
        if raw.timeout_secs == 0 {
            return Err(UpdateError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            timeout: Duration::from_secs(raw.timeout_secs),
            max_retries: raw.max_retries,
            retry_backoff: Duration::from_millis(raw.retry_backoff_ms),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawUpdateOptions {
    timeout_secs: u64,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl Default for RawUpdateOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = UpdateOptions::new();
        assert_eq!(options.timeout, Duration::from_secs(1200));
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.retry_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_builder() {
        let options = UpdateOptions::new()
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(0)
            .with_retry_backoff(Duration::from_millis(1));
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.max_retries, 0);
        assert_eq!(options.retry_backoff, Duration::from_millis(1));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let options = UpdateOptions::new().with_retry_backoff(Duration::from_secs(1));
        assert_eq!(options.backoff_for(1), Duration::from_secs(1));
        assert_eq!(options.backoff_for(2), Duration::from_secs(2));
        assert_eq!(options.backoff_for(3), Duration::from_secs(4));
        assert_eq!(options.backoff_for(10), MAX_RETRY_BACKOFF);
        assert_eq!(options.backoff_for(100), MAX_RETRY_BACKOFF);
    }

    #[test]
    fn test_from_value() {
        let options = UpdateOptions::from_value(json!({"retry_backoff_ms": 10})).unwrap();
        assert_eq!(options.retry_backoff, Duration::from_millis(10));
        assert_eq!(options.max_retries, DEFAULT_MAX_RETRIES);

        assert_eq!(
            UpdateOptions::from_value(serde_json::Value::Null).unwrap(),
            UpdateOptions::default()
        );
    }

    #[test]
    fn test_from_value_errors() {
        let err = UpdateOptions::from_value(json!({"timeout_secs": 0})).unwrap_err();
        assert!(matches!(err, UpdateError::Configuration(_)));

        let err = UpdateOptions::from_value(json!({"retries": 2})).unwrap_err();
        assert!(matches!(err, UpdateError::Serialization(_)));

        let err = UpdateOptions::from_value(json!({"max_retries": "three"})).unwrap_err();
        assert!(matches!(err, UpdateError::Serialization(_)));
    }
}
