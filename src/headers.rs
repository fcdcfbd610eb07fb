//! HTTP headers for rate limiting.
//!
//! Projects an [`AdmissionResult`] onto the standard `X-RateLimit-*` headers
//! and writes them into whatever header container the caller has, through
//! the [`HeaderSink`] capability.
//!
//! `X-RateLimit-Reset` carries the Unix epoch timestamp, in milliseconds, of
//! the next window boundary. `Retry-After` carries whole seconds, as HTTP
//! requires.

use std::collections::{BTreeMap, HashMap};

use crate::decision::AdmissionResult;
use crate::error::HeaderError;

/// Standard rate limit header names.
pub mod names {
    /// Maximum requests allowed per window.
    pub const RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";

    /// Remaining requests in current window.
    pub const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";

    /// Unix epoch milliseconds at which the window resets.
    pub const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";

    /// Seconds until the client should retry (standard HTTP header).
    pub const RETRY_AFTER: &str = "Retry-After";
}

/// Anything a header can be written into.
///
/// Setting a header replaces any previous value, which keeps emission
/// idempotent.
pub trait HeaderSink {
    /// Set `name` to `value`.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError>;
}

impl<H: HeaderSink + ?Sized> HeaderSink for &mut H {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        (**self).set_header(name, value)
    }
}

impl HeaderSink for HashMap<String, String> {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

impl HeaderSink for BTreeMap<String, String> {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

impl HeaderSink for Vec<(String, String)> {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        match self.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }
}

#[cfg(feature = "http")]
impl HeaderSink for http::HeaderMap {
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let name = http::HeaderName::try_from(name)
            .map_err(|_| HeaderError::InvalidName(name.to_string()))?;
        let header_value = http::HeaderValue::try_from(value)
            .map_err(|_| HeaderError::invalid_value(name.as_str(), value))?;
        self.insert(name, header_value);
        Ok(())
    }
}

/// Builder for rate limit headers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RateLimitHeaders {
    limit: Option<u64>,
    remaining: Option<u64>,
    reset: Option<u64>,
    retry_after: Option<u64>,
}

impl RateLimitHeaders {
    /// Create a new header builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit header.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the remaining header.
    pub fn remaining(mut self, remaining: u64) -> Self {
        self.remaining = Some(remaining);
        self
    }

    /// Set the reset header (Unix epoch milliseconds).
    pub fn reset(mut self, reset_at_ms: u64) -> Self {
        self.reset = Some(reset_at_ms);
        self
    }

    /// Set the retry-after header (seconds until retry).
    pub fn retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Convert to a vector of (name, value) pairs.
    pub fn to_vec(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();

        if let Some(limit) = self.limit {
            headers.push((names::RATE_LIMIT_LIMIT, limit.to_string()));
        }
        if let Some(remaining) = self.remaining {
            headers.push((names::RATE_LIMIT_REMAINING, remaining.to_string()));
        }
        if let Some(reset) = self.reset {
            headers.push((names::RATE_LIMIT_RESET, reset.to_string()));
        }
        if let Some(retry_after) = self.retry_after {
            headers.push((names::RETRY_AFTER, retry_after.to_string()));
        }

        headers
    }

    /// Write every header into `sink`.
    ///
    /// A header the sink refuses is logged and skipped; the others are still
    /// written. Returns the number of headers written.
    pub fn emit<H: HeaderSink + ?Sized>(&self, sink: &mut H) -> usize {
        let mut written = 0;
        for (name, value) in self.to_vec() {
            match sink.set_header(name, &value) {
                Ok(()) => written += 1,
                Err(error) => {
                    tracing::warn!(header = name, %error, "skipping rate limit header");
                }
            }
        }
        written
    }
}

impl From<&AdmissionResult> for RateLimitHeaders {
    fn from(result: &AdmissionResult) -> Self {
        Self::new()
            .limit(result.limit())
            .remaining(result.remaining())
            .reset(result.reset_at_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RateLimitKey;

    struct RejectingSink {
        rejected: &'static str,
        accepted: Vec<String>,
    }

    impl HeaderSink for RejectingSink {
        fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
            if name == self.rejected {
                return Err(HeaderError::invalid_value(name, value));
            }
            self.accepted.push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_header_builder() {
        let headers = RateLimitHeaders::new()
            .limit(100)
            .remaining(50)
            .reset(1_700_000_060_000)
            .to_vec();

        assert_eq!(headers.len(), 3);
        assert!(headers.iter().any(|(k, v)| *k == "X-RateLimit-Limit" && v == "100"));
        assert!(headers.iter().any(|(k, v)| *k == "X-RateLimit-Remaining" && v == "50"));
        assert!(
            headers
                .iter()
                .any(|(k, v)| *k == "X-RateLimit-Reset" && v == "1700000060000")
        );
    }

    #[test]
    fn test_headers_with_retry_after() {
        let headers = RateLimitHeaders::new()
            .limit(100)
            .remaining(0)
            .retry_after(60)
            .to_vec();

        assert!(headers.iter().any(|(k, v)| *k == "Retry-After" && v == "60"));
    }

    #[test]
    fn test_from_result_has_three_headers() {
        let result = AdmissionResult::allowed(RateLimitKey::global(), 100, 99, 42);
        let headers = RateLimitHeaders::from(&result).to_vec();

        assert_eq!(
            headers,
            vec![
                ("X-RateLimit-Limit", "100".to_string()),
                ("X-RateLimit-Remaining", "99".to_string()),
                ("X-RateLimit-Reset", "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_emit_is_idempotent() {
        let result = AdmissionResult::allowed(RateLimitKey::global(), 10, 4, 9_000);
        let headers = RateLimitHeaders::from(&result);

        let mut map: HashMap<String, String> = HashMap::new();
        headers.emit(&mut map);
        let first = map.clone();
        headers.emit(&mut map);
        assert_eq!(map, first);

        let mut pairs: Vec<(String, String)> = Vec::new();
        headers.emit(&mut pairs);
        headers.emit(&mut pairs);
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_vec_sink_replaces_case_insensitively() {
        let mut pairs = vec![("x-ratelimit-limit".to_string(), "1".to_string())];
        pairs.set_header("X-RateLimit-Limit", "2").unwrap();
        assert_eq!(pairs, vec![("x-ratelimit-limit".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_emit_skips_rejected_header() {
        let result = AdmissionResult::denied(RateLimitKey::global(), 1, 9_000);
        let mut sink = RejectingSink {
            rejected: "X-RateLimit-Remaining",
            accepted: Vec::new(),
        };

        let written = RateLimitHeaders::from(&result).emit(&mut sink);
        assert_eq!(written, 2);
        assert_eq!(sink.accepted, vec!["X-RateLimit-Limit", "X-RateLimit-Reset"]);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_header_map_sink() {
        let result = AdmissionResult::allowed(RateLimitKey::global(), 100, 99, 1_000);
        let mut map = http::HeaderMap::new();
        RateLimitHeaders::from(&result).emit(&mut map);

        assert_eq!(map.get("x-ratelimit-limit").unwrap(), "100");
        assert_eq!(map.get("x-ratelimit-remaining").unwrap(), "99");
        assert_eq!(map.get("x-ratelimit-reset").unwrap(), "1000");
        assert!(map.set_header("bad header", "1").is_err());
    }
}
