//! Runtime configuration for stores and the change bus.
//!
//! Durations are expressed in milliseconds so a config file stays readable:
//!
//! ```json
//! { "debounce_ms": 500, "request_timeout_ms": 10000,
//!   "reconnect": { "reconnect_delay_ms": 1000, "max_reconnect_attempts": 5 } }
//! ```

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Synchronization settings shared by stores and the change bus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet period before a burst of change events triggers one refresh.
    /// Default: 500ms
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Timeout applied to every data-access call. Zero disables it.
    /// Default: 10 seconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Max buffered updates per store observer before it is dropped.
    /// Default: 64
    #[serde(default = "default_observer_buffer")]
    pub observer_buffer: usize,

    /// Push transport reconnection policy.
    #[serde(default)]
    pub reconnect: ReconnectOptions,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_observer_buffer() -> usize {
    64
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            observer_buffer: default_observer_buffer(),
            reconnect: ReconnectOptions::default(),
        }
    }
}

impl SyncConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.observer_buffer == 0 {
            return Err(SyncError::Config("observer_buffer must be > 0".into()));
        }
        if self.reconnect.max_reconnect_delay_ms < self.reconnect.reconnect_delay_ms {
            return Err(SyncError::Config(format!(
                "max_reconnect_delay_ms ({}) is below reconnect_delay_ms ({})",
                self.reconnect.max_reconnect_delay_ms, self.reconnect.reconnect_delay_ms
            )));
        }
        Ok(())
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    pub fn with_observer_buffer(mut self, size: usize) -> Self {
        self.observer_buffer = size;
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectOptions) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `None` when timeouts are disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.request_timeout_ms))
        }
    }
}

/// Reconnection policy for the push transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconnectOptions {
    /// Reconnect automatically after the transport drops.
    /// Default: true
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Initial backoff delay, doubled per failed attempt.
    /// Default: 1000ms
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Backoff ceiling.
    /// Default: 30000ms
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Give up after this many consecutive failures. None = retry forever.
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}

impl Default for ReconnectOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: default_auto_reconnect(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            max_reconnect_attempts: None,
        }
    }
}

impl ReconnectOptions {
    /// Delay before reconnect attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = std::cmp::min(
            self.reconnect_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt)),
            self.max_reconnect_delay_ms,
        );
        Duration::from_millis(delay)
    }

    pub fn with_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.reconnect_delay_ms = ms;
        self
    }

    pub fn with_max_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.max_reconnect_delay_ms = ms;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_owner_app() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
        assert!(config.reconnect.auto_reconnect);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SyncConfig::from_json_str(r#"{ "debounce_ms": 200 }"#).unwrap();
        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.reconnect.reconnect_delay_ms, 1000);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = SyncConfig::default().with_request_timeout_ms(0);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let opts = ReconnectOptions::default()
            .with_reconnect_delay_ms(100)
            .with_max_reconnect_delay_ms(1000);
        assert_eq!(opts.backoff(0), Duration::from_millis(100));
        assert_eq!(opts.backoff(1), Duration::from_millis(200));
        assert_eq!(opts.backoff(3), Duration::from_millis(800));
        assert_eq!(opts.backoff(4), Duration::from_millis(1000));
        assert_eq!(opts.backoff(60), Duration::from_millis(1000));
    }

    #[test]
    fn test_rejects_inverted_backoff() {
        let result = SyncConfig::from_json_str(
            r#"{ "reconnect": { "reconnect_delay_ms": 5000, "max_reconnect_delay_ms": 10 } }"#,
        );
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "observer_buffer": 8, "reconnect": {{ "max_reconnect_attempts": 3 }} }}"#)
            .unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.observer_buffer, 8);
        assert_eq!(config.reconnect.max_reconnect_attempts, Some(3));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = SyncConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(SyncError::Io(_))));
    }
}
