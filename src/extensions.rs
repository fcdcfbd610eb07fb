//! Request extensions and response bodies carrying admission info.
//!
//! The axum middleware inserts an [`AdmissionExt`] into request extensions so
//! handlers can read the verdict without re-evaluating, and answers rejected
//! requests with a serialized [`RateLimitResponse`].
//!
//! # Example
//!
//! ```ignore
//! use axum::Extension;
//! use admission_gate::extensions::AdmissionExt;
//!
//! async fn handler(Extension(admission): Extension<AdmissionExt>) {
//!     println!("Remaining: {}", admission.remaining());
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::decision::AdmissionResult;

/// Admission info available via request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionExt {
    result: AdmissionResult,
}

impl AdmissionExt {
    /// Wrap a verdict.
    pub fn new(result: AdmissionResult) -> Self {
        Self { result }
    }

    /// The verdict.
    pub fn result(&self) -> &AdmissionResult {
        &self.result
    }

    /// The key the request was counted against.
    pub fn key(&self) -> &str {
        self.result.key().as_str()
    }

    /// Remaining requests in the current window.
    pub fn remaining(&self) -> u64 {
        self.result.remaining()
    }

    /// Check if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        self.result.is_allowed()
    }
}

/// JSON body for rate limit responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResponse {
    /// Short error label, present on rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the request was allowed.
    pub allowed: bool,
    /// Maximum requests allowed per window.
    pub limit: u64,
    /// Remaining requests in current window.
    pub remaining: u64,
    /// Unix epoch milliseconds at which the window resets.
    pub reset_at_ms: u64,
    /// Seconds to wait before retrying, present on rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl RateLimitResponse {
    /// Build the body for `result` as seen at `now_ms`.
    pub fn from_result(result: &AdmissionResult, now_ms: u64) -> Self {
        Self {
            error: result.is_denied().then(|| "Too Many Requests".to_string()),
            allowed: result.is_allowed(),
            limit: result.limit(),
            remaining: result.remaining(),
            reset_at_ms: result.reset_at_ms(),
            retry_after_seconds: result.retry_after_secs(now_ms),
        }
    }
}
