//! Axum middleware for request admission.
//!
//! Provides a Tower layer that evaluates every request against a shared
//! [`RateLimiter`](crate::RateLimiter), adds the rate limit headers to the
//! response and answers rejected requests with `429 Too Many Requests`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use axum::{Router, routing::get};
//! use admission_gate::{RateLimiter, key::IdentityKey, middleware::RateLimitLayer};
//!
//! let limiter = Arc::new(RateLimiter::with_limit(100));
//!
//! let app = Router::new()
//!     .route("/api/scenarios", get(handler))
//!     .layer(RateLimitLayer::new(limiter, IdentityKey::user_id()));
//! ```

mod layer;

pub use layer::{RateLimitLayer, RateLimitService};
