//! Process-wide limiter for test harnesses.
//!
//! Application code should construct a [`RateLimiter`] and inject it. This
//! module only exists so test suites that exercise code holding the shared
//! instance can start every case from a clean slate.

use std::sync::OnceLock;

use crate::limiter::RateLimiter;

static SHARED_LIMITER: OnceLock<RateLimiter> = OnceLock::new();

/// The shared limiter, created with the production default on first use.
pub fn shared_limiter() -> &'static RateLimiter {
    SHARED_LIMITER.get_or_init(|| {
        tracing::debug!("initializing shared rate limiter");
        RateLimiter::new()
    })
}

/// Clear every counter of the shared limiter, creating it if needed.
pub fn reset_shared_limiter() {
    shared_limiter().reset(None);
}
