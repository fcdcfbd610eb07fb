//! In-process request admission controller.
//!
//! `admission_gate` decides, per request, whether a caller may proceed under a
//! per-key quota over a time window, and reports the outcome through the
//! standard rate limit headers:
//!
//! - **Counter Store**: lock-sharded in-memory counters with atomic increments
//! - **Window Policy**: fixed windows per key, or epoch-aligned windows
//! - **Admission Evaluator**: `check` / `limit` return an immutable verdict
//! - **Header Emitter**: `X-RateLimit-Limit`, `X-RateLimit-Remaining`,
//!   `X-RateLimit-Reset` written into any [`HeaderSink`]
//! - **Framework Integration**: Axum middleware (feature `axum`)
//!
//! # Quick Start
//!
//! ```
//! use admission_gate::RateLimiter;
//!
//! let limiter = RateLimiter::with_limit(2);
//!
//! assert!(limiter.check(Some("user:123")).is_allowed());
//! assert!(limiter.check(Some("user:123")).is_allowed());
//!
//! let result = limiter.check(Some("user:123"));
//! assert!(result.is_denied());
//! assert_eq!(result.remaining(), 0);
//! ```
//!
//! # Header Convention
//!
//! `X-RateLimit-Reset` is the Unix epoch timestamp in **milliseconds** of the
//! next window boundary, identical to [`AdmissionResult::reset_at_ms`].
//!
//! # Feature Flags
//!
//! - `http`: [`HeaderSink`] for `http::HeaderMap`, key extraction from
//!   `http::Request`
//! - `axum`: Axum/Tower middleware (implies `http`)

pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod extensions;
pub mod headers;
pub mod key;
pub mod limiter;
pub mod shared;
pub mod storage;
pub mod window;

#[cfg(feature = "axum")]
pub mod middleware;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_LIMIT, DEFAULT_WINDOW, LimiterConfig, LimiterConfigBuilder};
pub use decision::AdmissionResult;
pub use error::{AdmissionError, ConfigError, HeaderError, Result};
pub use headers::{HeaderSink, RateLimitHeaders};
pub use key::{FnKey, GlobalKey, IdentityKey, Key, RateLimitKey, StaticKey};
pub use limiter::{RateLimiter, RateLimiterBuilder, create_rate_limiter};
pub use shared::{reset_shared_limiter, shared_limiter};
pub use storage::{CounterStore, MemoryStore, SweepConfig, SweepInterval, WindowCounter};
pub use window::{AlignedWindow, FixedWindow, WindowPolicy};

// Re-export extensions
pub use extensions::{AdmissionExt, RateLimitResponse};

#[cfg(feature = "axum")]
pub use middleware::RateLimitLayer;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::LimiterConfig;
    pub use crate::decision::AdmissionResult;
    pub use crate::headers::HeaderSink;
    pub use crate::key::RateLimitKey;
    pub use crate::limiter::{RateLimiter, create_rate_limiter};
    pub use crate::storage::{CounterStore, MemoryStore};
    pub use crate::window::{AlignedWindow, FixedWindow, WindowPolicy};
}
