//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Redis connection URL, including the broker credential
    pub redis_url: String,

    /// Upper bound on a single publish to the broker
    pub publish_timeout: Duration,

    /// Depth of each viewer's inbound event queue (default: 100)
    pub viewer_queue_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            redis_url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
            publish_timeout: Duration::from_millis(
                positive(env::var("PUBLISH_TIMEOUT_MS").ok()).unwrap_or(5000),
            ),
            viewer_queue_capacity: positive(env::var("VIEWER_QUEUE_CAPACITY").ok())
                .unwrap_or(100),
        })
    }

    /// Create a default configuration for testing.
    ///
    /// Redis-backed tests expect: `docker run -d --name sms-relay-test-redis -p 6380:6379 redis:7`
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            redis_url: "redis://localhost:6380".into(),
            publish_timeout: Duration::from_secs(2),
            viewer_queue_capacity: 100,
        }
    }
}

/// Parse a numeric setting, treating zero and garbage as unset.
fn positive<T>(raw: Option<String>) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > T::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_invalid_values_fall_back() {
        assert_eq!(positive::<u64>(Some("0".into())), None);
        assert_eq!(positive::<u64>(Some("soon".into())), None);
        assert_eq!(positive::<u64>(None), None);
        assert_eq!(positive::<usize>(Some("0".into())), None);
    }

    #[test]
    fn positive_values_are_kept() {
        assert_eq!(positive::<u64>(Some("250".into())), Some(250));
        assert_eq!(positive::<usize>(Some(" 16 ".into())), Some(16));
    }
}
