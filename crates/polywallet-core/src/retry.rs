//! Bounded retry policy for adapter transport calls.
//!
//! Retries live inside the adapter, never in the aggregator, so the
//! aggregator's wait-for-all join contract stays simple.

use std::time::Duration;

/// Configuration for the adapter-level retry mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub enabled: bool,
    /// Maximum number of retries; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// HTTP status codes that trigger a retry.
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 1,
            delay: Duration::from_millis(250),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            delay,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.enabled && self.retry_on_status.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retries_once_on_server_errors() {
        let config = RetryConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_retries, 1);
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(401));
    }

    #[test]
    fn disabled_config_never_retries_statuses() {
        let config = RetryConfig::no_retry();
        assert!(!config.should_retry_status(503));
    }
}
