//! The admission evaluator.
//!
//! A `RateLimiter` owns its counter store, window policy and clock. Build one
//! at startup, share it behind an `Arc`, and call [`RateLimiter::check`] or
//! [`RateLimiter::limit`] once per request.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use admission_gate::RateLimiter;
//!
//! let limiter = RateLimiter::with_limit(100);
//!
//! let mut headers: HashMap<String, String> = HashMap::new();
//! let result = limiter.limit(Some(&mut headers), Some("user:42"));
//!
//! assert!(result.is_allowed());
//! assert_eq!(headers["X-RateLimit-Limit"], "100");
//! assert_eq!(headers["X-RateLimit-Remaining"], "99");
//! ```

use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::LimiterConfig;
use crate::decision::AdmissionResult;
use crate::headers::{HeaderSink, RateLimitHeaders};
use crate::key::RateLimitKey;
use crate::storage::{CounterStore, MemoryStore};
use crate::window::{FixedWindow, WindowPolicy};

/// In-process request admission controller.
///
/// Every instance owns an independent counter store; two limiters never
/// share counts.
pub struct RateLimiter<S = MemoryStore, P = FixedWindow, C = SystemClock> {
    config: LimiterConfig,
    store: S,
    policy: P,
    clock: C,
}

impl<S, P, C> std::fmt::Debug for RateLimiter<S, P, C>
where
    S: CounterStore,
    P: WindowPolicy,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("policy", &self.policy.name())
            .field("keys", &self.store.len())
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter with the production default configuration.
    pub fn new() -> Self {
        Self::from_config(LimiterConfig::default())
    }

    /// Create a limiter admitting `limit` requests per default window.
    pub fn with_limit(limit: u64) -> Self {
        Self::from_config(LimiterConfig::with_limit(limit))
    }

    /// Create a limiter from a configuration.
    pub fn from_config(config: LimiterConfig) -> Self {
        Self {
            config,
            store: MemoryStore::new(),
            policy: FixedWindow::new(),
            clock: SystemClock,
        }
    }

    /// Start building a limiter with a custom store, policy or clock.
    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::new()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a limiter, using [`DEFAULT_LIMIT`](crate::config::DEFAULT_LIMIT)
/// when `limit` is `None`.
pub fn create_rate_limiter(limit: Option<u64>) -> RateLimiter {
    match limit {
        Some(limit) => RateLimiter::with_limit(limit),
        None => RateLimiter::new(),
    }
}

impl<S, P, C> RateLimiter<S, P, C>
where
    S: CounterStore,
    P: WindowPolicy,
    C: Clock,
{
    /// Count a request for `key` and decide whether it may proceed.
    ///
    /// `None` or an empty key counts against the global scope.
    pub fn check(&self, key: Option<&str>) -> AdmissionResult {
        self.check_key(&RateLimitKey::from_identity(key))
    }

    /// Count a request for an already-built key.
    pub fn check_key(&self, key: &RateLimitKey) -> AdmissionResult {
        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms();
        let counter = self
            .store
            .increment(key.as_str(), now, &self.policy, window_ms);
        let reset_at = self.policy.reset_at(&counter, window_ms);
        let result =
            AdmissionResult::from_count(key.clone(), counter.count, self.config.limit(), reset_at);

        if result.is_allowed() {
            tracing::trace!(
                key = %key,
                count = counter.count,
                limit = self.config.limit(),
                "request admitted"
            );
        } else {
            tracing::debug!(
                key = %key,
                count = counter.count,
                limit = self.config.limit(),
                reset_at_ms = reset_at,
                "request rejected by rate limit"
            );
        }

        result
    }

    /// Report usage for `key` without counting a request.
    ///
    /// `allowed` tells whether the next request would be admitted.
    pub fn peek(&self, key: Option<&str>) -> AdmissionResult {
        let key = RateLimitKey::from_identity(key);
        let now = self.clock.now_ms();
        let window_ms = self.config.window_ms();
        let counter = self.store.peek(key.as_str(), now, &self.policy, window_ms);
        let reset_at = self.policy.reset_at(&counter, window_ms);
        let limit = self.config.limit();

        if counter.count < limit {
            AdmissionResult::allowed(key, limit, limit - counter.count, reset_at)
        } else {
            AdmissionResult::denied(key, limit, reset_at)
        }
    }

    /// Run [`check`](Self::check) and write the rate limit headers onto the
    /// response.
    ///
    /// Without a sink the headers are skipped; the verdict is returned either
    /// way so the caller can respond 429 without re-evaluating.
    pub fn limit<H>(&self, sink: Option<&mut H>, key: Option<&str>) -> AdmissionResult
    where
        H: HeaderSink + ?Sized,
    {
        let result = self.check(key);
        match sink {
            Some(sink) => {
                RateLimitHeaders::from(&result).emit(sink);
            }
            None => {
                tracing::trace!(key = %result.key(), "no header sink, skipping rate limit headers");
            }
        }
        result
    }

    /// Clear counters for one key, or every key when `key` is `None`.
    ///
    /// Administrative and test use only; not part of the admission path.
    pub fn reset(&self, key: Option<&str>) {
        match key {
            Some(key) => self.store.reset(Some(RateLimitKey::from_identity(Some(key)).as_str())),
            None => self.store.reset(None),
        }
    }

    /// The limiter's configuration.
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// The window policy in use.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The counter store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Builder for [`RateLimiter`].
#[derive(Debug)]
pub struct RateLimiterBuilder<S = MemoryStore, P = FixedWindow, C = SystemClock> {
    config: LimiterConfig,
    store: S,
    policy: P,
    clock: C,
}

impl RateLimiterBuilder {
    /// Create a builder with the production defaults.
    pub fn new() -> Self {
        Self {
            config: LimiterConfig::default(),
            store: MemoryStore::new(),
            policy: FixedWindow::new(),
            clock: SystemClock,
        }
    }
}

impl Default for RateLimiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P, C> RateLimiterBuilder<S, P, C> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: LimiterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the limit, keeping the window.
    pub fn limit(mut self, limit: u64) -> Self {
        self.config = LimiterConfig::new(limit, self.config.window());
        self
    }

    /// Set the window, keeping the limit.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero.
    pub fn window(mut self, window: Duration) -> Self {
        self.config = LimiterConfig::new(self.config.limit(), window);
        self
    }

    /// Use a different counter store.
    pub fn store<S2: CounterStore>(self, store: S2) -> RateLimiterBuilder<S2, P, C> {
        RateLimiterBuilder {
            config: self.config,
            store,
            policy: self.policy,
            clock: self.clock,
        }
    }

    /// Use a different window policy.
    pub fn policy<P2: WindowPolicy>(self, policy: P2) -> RateLimiterBuilder<S, P2, C> {
        RateLimiterBuilder {
            config: self.config,
            store: self.store,
            policy,
            clock: self.clock,
        }
    }

    /// Use a different clock.
    pub fn clock<C2: Clock>(self, clock: C2) -> RateLimiterBuilder<S, P, C2> {
        RateLimiterBuilder {
            config: self.config,
            store: self.store,
            policy: self.policy,
            clock,
        }
    }

    /// Build the limiter.
    pub fn build(self) -> RateLimiter<S, P, C> {
        RateLimiter {
            config: self.config,
            store: self.store,
            policy: self.policy,
            clock: self.clock,
        }
    }
}
