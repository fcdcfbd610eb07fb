//! Tower layer for request admission in Axum.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request, Response, StatusCode, header},
};
use tower::{Layer, Service};

use crate::clock::{Clock, SystemClock};
use crate::decision::AdmissionResult;
use crate::extensions::{AdmissionExt, RateLimitResponse};
use crate::headers::RateLimitHeaders;
use crate::key::Key;
use crate::limiter::RateLimiter;
use crate::storage::{CounterStore, MemoryStore};
use crate::window::{FixedWindow, WindowPolicy};

/// Tower layer for request admission.
pub struct RateLimitLayer<K, S = MemoryStore, P = FixedWindow, C = SystemClock> {
    limiter: Arc<RateLimiter<S, P, C>>,
    key_extractor: K,
}

impl<K, S, P, C> RateLimitLayer<K, S, P, C> {
    /// Create a new layer around a shared limiter.
    pub fn new(limiter: Arc<RateLimiter<S, P, C>>, key_extractor: K) -> Self {
        Self {
            limiter,
            key_extractor,
        }
    }

    /// The limiter this layer consults.
    pub fn limiter(&self) -> &Arc<RateLimiter<S, P, C>> {
        &self.limiter
    }
}

impl<K: Clone, S, P, C> Clone for RateLimitLayer<K, S, P, C> {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            key_extractor: self.key_extractor.clone(),
        }
    }
}

impl<K: Clone, S, P, C, Inner> Layer<Inner> for RateLimitLayer<K, S, P, C> {
    type Service = RateLimitService<Inner, K, S, P, C>;

    fn layer(&self, inner: Inner) -> Self::Service {
        RateLimitService {
            inner,
            limiter: Arc::clone(&self.limiter),
            key_extractor: self.key_extractor.clone(),
        }
    }
}

/// The admission service.
pub struct RateLimitService<Inner, K, S = MemoryStore, P = FixedWindow, C = SystemClock> {
    inner: Inner,
    limiter: Arc<RateLimiter<S, P, C>>,
    key_extractor: K,
}

impl<Inner: Clone, K: Clone, S, P, C> Clone for RateLimitService<Inner, K, S, P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: Arc::clone(&self.limiter),
            key_extractor: self.key_extractor.clone(),
        }
    }
}

impl<Inner, K, S, P, C> Service<Request<Body>> for RateLimitService<Inner, K, S, P, C>
where
    Inner: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    Inner::Future: Send,
    K: Key<Request<Body>>,
    S: CounterStore,
    P: WindowPolicy,
    C: Clock,
{
    type Response = Response<Body>;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let key = self.key_extractor.extract(&request);
        let mut headers = HeaderMap::new();
        let result = self.limiter.limit(Some(&mut headers), key.as_deref());

        if result.is_denied() {
            let response = rate_limited_response(&result, headers, self.limiter.clock().now_ms());
            return Box::pin(async move { Ok(response) });
        }

        request.extensions_mut().insert(AdmissionExt::new(result));

        // Drive the instance that was polled ready, leave the clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            response.headers_mut().extend(headers);
            Ok(response)
        })
    }
}

/// Create a 429 Too Many Requests response.
fn rate_limited_response(
    result: &AdmissionResult,
    mut headers: HeaderMap,
    now_ms: u64,
) -> Response<Body> {
    let body = RateLimitResponse::from_result(result, now_ms);
    let retry_after = body.retry_after_seconds.unwrap_or(0);
    RateLimitHeaders::new()
        .retry_after(retry_after)
        .emit(&mut headers);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    let json = serde_json::to_string(&body).unwrap_or_default();
    let mut response = Response::new(Body::from(json));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    *response.headers_mut() = headers;
    response
}
