//! Key extractors that read the caller identity from a request.
//!
//! These extractors are generic and work with any request type that exposes
//! the necessary data through the traits below.

use std::net::IpAddr;

use crate::key::Key;

// ============================================================================
// Request Info Traits
// ============================================================================

/// Trait for requests that have an IP address.
pub trait HasIpAddr {
    /// Get the client IP address.
    fn client_ip(&self) -> Option<IpAddr>;
}

/// Trait for requests that have headers.
pub trait HasHeaders {
    /// Get a header value by name.
    fn header(&self, name: &str) -> Option<&str>;
}

#[cfg(feature = "http")]
impl<B> HasHeaders for http::Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(feature = "axum")]
impl<B> HasIpAddr for http::Request<B> {
    fn client_ip(&self) -> Option<IpAddr> {
        self.extensions()
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
            .map(|info| info.0.ip())
    }
}

// ============================================================================
// Identity Extractors
// ============================================================================

/// Extract the caller identity from a header set by the authentication layer.
///
/// The header value is used verbatim, prefixed with `user:`. A missing or
/// blank header yields `None`, which the limiter treats as the global scope.
#[derive(Debug, Clone)]
pub struct IdentityKey {
    header_name: &'static str,
}

impl IdentityKey {
    /// Create an identity extractor reading the given header.
    pub fn new(header_name: &'static str) -> Self {
        Self { header_name }
    }

    /// Read `x-user-id`.
    pub fn user_id() -> Self {
        Self::new("x-user-id")
    }
}

impl Default for IdentityKey {
    fn default() -> Self {
        Self::user_id()
    }
}

impl<R: HasHeaders> Key<R> for IdentityKey {
    fn extract(&self, request: &R) -> Option<String> {
        request
            .header(self.header_name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("user:{}", v))
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Extract key from client IP address.
#[derive(Debug, Clone, Default)]
pub struct IpKey {
    /// Header to check for real IP (e.g., X-Forwarded-For).
    real_ip_header: Option<&'static str>,
}

impl IpKey {
    /// Create a new IP key extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use X-Forwarded-For header to get real IP behind proxy.
    pub fn with_forwarded_for() -> Self {
        Self {
            real_ip_header: Some("x-forwarded-for"),
        }
    }
}

impl<R> Key<R> for IpKey
where
    R: HasIpAddr + HasHeaders,
{
    fn extract(&self, request: &R) -> Option<String> {
        let forwarded = self
            .real_ip_header
            .and_then(|header| request.header(header))
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded {
            return Some(format!("ip:{}", ip));
        }

        request.client_ip().map(|ip| format!("ip:{}", ip))
    }

    fn name(&self) -> &'static str {
        "ip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockRequest {
        ip: Option<IpAddr>,
        headers: HashMap<String, String>,
    }

    impl HasIpAddr for MockRequest {
        fn client_ip(&self) -> Option<IpAddr> {
            self.ip
        }
    }

    impl HasHeaders for MockRequest {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).map(|s| s.as_str())
        }
    }

    #[test]
    fn test_identity_key() {
        let key = IdentityKey::user_id();
        let mut req = MockRequest::default();
        req.headers.insert("x-user-id".into(), "analyst-42".into());

        assert_eq!(key.extract(&req), Some("user:analyst-42".to_string()));
    }

    #[test]
    fn test_identity_key_missing_or_blank() {
        let key = IdentityKey::user_id();
        let mut req = MockRequest::default();
        assert_eq!(key.extract(&req), None);

        req.headers.insert("x-user-id".into(), "   ".into());
        assert_eq!(key.extract(&req), None);
    }

    #[test]
    fn test_ip_key() {
        let key = IpKey::new();
        let req = MockRequest {
            ip: Some("192.168.1.1".parse().unwrap()),
            ..Default::default()
        };

        assert_eq!(key.extract(&req), Some("ip:192.168.1.1".to_string()));
    }

    #[test]
    fn test_ip_key_with_forwarded_for() {
        let key = IpKey::with_forwarded_for();
        let mut req = MockRequest {
            ip: Some("10.0.0.1".parse().unwrap()),
            ..Default::default()
        };
        req.headers
            .insert("x-forwarded-for".into(), "203.0.113.50, 70.41.3.18".into());

        // Should use the first IP from X-Forwarded-For
        assert_eq!(key.extract(&req), Some("ip:203.0.113.50".to_string()));
    }
}
