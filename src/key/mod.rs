//! Rate limit keys and key extraction.
//!
//! A [`RateLimitKey`] names the scope a quota is tracked against: a caller
//! identity, an IP address, or the global sentinel used when no identity is
//! available. The [`Key`] trait turns a request into such a key.
//!
//! # Example
//!
//! ```
//! use admission_gate::key::RateLimitKey;
//!
//! assert_eq!(RateLimitKey::from_identity(Some("user:7")).as_str(), "user:7");
//! assert!(RateLimitKey::from_identity(None).is_global());
//! assert!(RateLimitKey::from_identity(Some("")).is_global());
//! ```

mod extractors;

pub use extractors::*;

use std::borrow::Borrow;
use std::fmt;

/// Opaque, case-sensitive, non-empty key a quota is tracked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateLimitKey(String);

impl RateLimitKey {
    /// Sentinel for the global/anonymous scope.
    pub const GLOBAL: &'static str = "global";

    /// The global key.
    pub fn global() -> Self {
        Self(Self::GLOBAL.to_string())
    }

    /// Build a key from an optional caller identity.
    ///
    /// `None` and the empty string collapse to [`RateLimitKey::GLOBAL`].
    pub fn from_identity(identity: Option<&str>) -> Self {
        match identity {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::global(),
        }
    }

    /// Whether this is the global key.
    pub fn is_global(&self) -> bool {
        self.0 == Self::GLOBAL
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for RateLimitKey {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RateLimitKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RateLimitKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RateLimitKey {
    fn from(value: &str) -> Self {
        Self::from_identity(Some(value))
    }
}

impl From<String> for RateLimitKey {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::global()
        } else {
            Self(value)
        }
    }
}

impl From<Option<&str>> for RateLimitKey {
    fn from(value: Option<&str>) -> Self {
        Self::from_identity(value)
    }
}

/// Trait for extracting rate limiting keys from requests.
///
/// Return `None` when no identity is available; the limiter then applies the
/// global key.
///
/// # Type Parameters
///
/// - `R`: The request type (e.g., `http::Request<B>`)
pub trait Key<R>: Send + Sync + 'static {
    /// Extract a rate limiting key from the request.
    fn extract(&self, request: &R) -> Option<String>;

    /// Get the key name for logging.
    fn name(&self) -> &'static str;
}

/// A constant key that applies the same limit to all requests.
#[derive(Debug, Clone, Default)]
pub struct GlobalKey;

impl GlobalKey {
    /// Create a new global key.
    pub fn new() -> Self {
        Self
    }
}

impl<R> Key<R> for GlobalKey {
    fn extract(&self, _request: &R) -> Option<String> {
        Some(RateLimitKey::GLOBAL.to_string())
    }

    fn name(&self) -> &'static str {
        "global"
    }
}

/// A key that extracts a specific field from the request.
///
/// This is a generic extractor that can be configured with a closure.
#[derive(Clone)]
pub struct FnKey<F> {
    extractor: F,
    name: &'static str,
}

impl<F> fmt::Debug for FnKey<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnKey").field("name", &self.name).finish()
    }
}

impl<F> FnKey<F> {
    /// Create a new function-based key extractor.
    pub fn new(name: &'static str, extractor: F) -> Self {
        Self { extractor, name }
    }
}

impl<R, F> Key<R> for FnKey<F>
where
    F: Fn(&R) -> Option<String> + Send + Sync + 'static,
{
    fn extract(&self, request: &R) -> Option<String> {
        (self.extractor)(request)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A key that always returns a static value.
#[derive(Debug, Clone)]
pub struct StaticKey {
    key: String,
}

impl StaticKey {
    /// Create a new static key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl<R> Key<R> for StaticKey {
    fn extract(&self, _request: &R) -> Option<String> {
        Some(self.key.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
