//! Limiter configuration.
//!
//! A `LimiterConfig` fixes how many requests a key may make per window and
//! how long a window lasts. It is immutable once built.
//!
//! # Examples
//!
//! ```
//! use admission_gate::LimiterConfig;
//! use std::time::Duration;
//!
//! // Production default: 100 requests per minute
//! let config = LimiterConfig::default();
//! assert_eq!(config.limit(), 100);
//!
//! // Test fixture: one request per minute
//! let config = LimiterConfig::with_limit(1);
//!
//! // Custom: 50 requests per 30 seconds
//! let config = LimiterConfig::new(50, Duration::from_secs(30));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::duration_ms;
use crate::error::{ConfigError, Result};

/// Requests admitted per window when no limit is given.
pub const DEFAULT_LIMIT: u64 = 100;

/// Window length when none is given.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Immutable limiter configuration.
///
/// A `limit` of 0 is valid and rejects every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum admitted requests per key per window.
    limit: u64,

    /// Window duration.
    #[serde(rename = "window_ms", with = "window_ms")]
    window: Duration,
}

impl LimiterConfig {
    /// Create a new configuration.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero. Use [`LimiterConfig::try_new`] to validate
    /// untrusted input instead.
    pub fn new(limit: u64, window: Duration) -> Self {
        assert!(!window.is_zero(), "window must be non-zero");
        Self { limit, window }
    }

    /// Try to create a new configuration, returning an error if invalid.
    pub fn try_new(limit: u64, window: Duration) -> Result<Self> {
        if window.is_zero() {
            return Err(ConfigError::InvalidWindow("window must be non-zero".into()).into());
        }
        Ok(Self { limit, window })
    }

    /// `limit` requests per [`DEFAULT_WINDOW`].
    pub fn with_limit(limit: u64) -> Self {
        Self::new(limit, DEFAULT_WINDOW)
    }

    /// `n` requests per second.
    pub fn per_second(n: u64) -> Self {
        Self::new(n, Duration::from_secs(1))
    }

    /// `n` requests per minute.
    pub fn per_minute(n: u64) -> Self {
        Self::new(n, Duration::from_secs(60))
    }

    /// `n` requests per hour.
    pub fn per_hour(n: u64) -> Self {
        Self::new(n, Duration::from_secs(3600))
    }

    /// Maximum admitted requests per window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window duration in milliseconds, never less than 1.
    pub fn window_ms(&self) -> u64 {
        duration_ms(self.window).max(1)
    }

    /// Check invariants of a deserialized configuration.
    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(ConfigError::InvalidWindow("window must be non-zero".into()).into());
        }
        Ok(())
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }
}

/// Builder for creating configurations with validation.
#[derive(Debug, Default)]
pub struct LimiterConfigBuilder {
    limit: Option<u64>,
    window: Option<Duration>,
}

impl LimiterConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set the window duration.
    pub fn window(mut self, duration: Duration) -> Self {
        self.window = Some(duration);
        self
    }

    /// Build the configuration, returning an error if invalid.
    pub fn build(self) -> Result<LimiterConfig> {
        let limit = self
            .limit
            .ok_or_else(|| ConfigError::MissingRequired("limit".into()))?;
        let window = self
            .window
            .ok_or_else(|| ConfigError::MissingRequired("window".into()))?;

        LimiterConfig::try_new(limit, window)
    }
}

mod window_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(window: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(crate::clock::duration_ms(*window))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
