//! Admission verdicts.
//!
//! Every evaluation returns an `AdmissionResult`: whether the request may
//! proceed, plus the usage metadata the header emitter projects onto the
//! response. A rejection is a normal outcome, not an error.

use std::time::Duration;

use serde::Serialize;

use crate::key::RateLimitKey;

/// The result of one admission check.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionResult {
    /// Whether the request is allowed.
    allowed: bool,
    /// Maximum requests per window.
    limit: u64,
    /// Requests left in the current window.
    remaining: u64,
    /// Next window boundary (Unix milliseconds).
    reset_at_ms: u64,
    /// Key the request was counted against.
    #[serde(skip)]
    key: RateLimitKey,
}

impl AdmissionResult {
    /// Build the verdict for a key whose post-increment count is `count`.
    ///
    /// `allowed` is `count <= limit` and `remaining` is
    /// `max(0, limit - count)`.
    pub fn from_count(key: RateLimitKey, count: u64, limit: u64, reset_at_ms: u64) -> Self {
        Self {
            allowed: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_at_ms,
            key,
        }
    }

    /// Create a new "allowed" result.
    pub fn allowed(key: RateLimitKey, limit: u64, remaining: u64, reset_at_ms: u64) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: remaining.min(limit),
            reset_at_ms,
            key,
        }
    }

    /// Create a new "denied" result.
    pub fn denied(key: RateLimitKey, limit: u64, reset_at_ms: u64) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_at_ms,
            key,
        }
    }

    /// Check if the request is allowed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Check if the request is denied.
    pub fn is_denied(&self) -> bool {
        !self.allowed
    }

    /// Maximum requests per window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Requests left in the current window.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Next window boundary (Unix milliseconds).
    pub fn reset_at_ms(&self) -> u64 {
        self.reset_at_ms
    }

    /// Key the request was counted against.
    pub fn key(&self) -> &RateLimitKey {
        &self.key
    }

    /// Time from `now_ms` until the window resets.
    pub fn time_until_reset(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.reset_at_ms.saturating_sub(now_ms))
    }

    /// Whole seconds to wait before retrying, rounded up.
    ///
    /// `None` for admitted requests.
    pub fn retry_after_secs(&self, now_ms: u64) -> Option<u64> {
        if self.allowed {
            return None;
        }
        let wait_ms = self.reset_at_ms.saturating_sub(now_ms);
        Some(wait_ms.div_ceil(1000))
    }
}
