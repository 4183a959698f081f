// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Token bucket rate limiting for ledger RPC calls.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use tower::Layer;

/// A Tower layer that throttles requests with a shared token bucket.
///
/// Every service produced by one layer draws from the same bucket, so clones
/// of a client share a single budget. An unlimited layer passes requests
/// straight through, which keeps the client type the same whether or not a
/// limit is configured.
///
/// ```rust
/// use blockvault::transport::RateLimitLayer;
///
/// let limited = RateLimitLayer::per_second(10);
/// let configured = RateLimitLayer::from_optional(None);
/// assert!(!configured.is_limited());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RateLimitLayer {
    bucket: Option<Arc<Mutex<TokenBucket>>>,
}

impl RateLimitLayer {
    /// Allows at most `requests` per `period`, with bursts up to `requests`.
    pub fn new(requests: u32, period: Duration) -> Self {
        Self {
            bucket: Some(Arc::new(Mutex::new(TokenBucket::new(requests, period)))),
        }
    }

    /// Allows at most `requests` per second.
    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// A layer that never delays requests.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Limited when a rate is given, unlimited otherwise.
    pub fn from_optional(requests_per_second: Option<u32>) -> Self {
        requests_per_second.map_or_else(Self::unlimited, Self::per_second)
    }

    /// Whether this layer throttles at all.
    pub fn is_limited(&self) -> bool {
        self.bucket.is_some()
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            service,
            bucket: self.bucket.clone(),
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    /// Tokens added per nanosecond
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(requests: u32, period: Duration) -> Self {
        // A zero rate would never refill; treat it as one request per period.
        let requests = requests.max(1) as f64;
        let period_nanos = period.as_nanos().max(1) as f64;
        Self {
            capacity: requests,
            tokens: requests,
            refill_rate: requests / period_nanos,
            last_refill: Instant::now(),
        }
    }

    /// Takes a token, or returns how long until one is available.
    fn take(&mut self) -> Option<Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_nanos() as f64;
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return None;
        }

        let wait_nanos = (1.0 - self.tokens) / self.refill_rate;
        Some(Duration::from_nanos(wait_nanos.ceil() as u64))
    }
}

/// A Tower service that waits for a token before forwarding each request.
#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    service: S,
    bucket: Option<Arc<Mutex<TokenBucket>>>,
}

impl<S, Request> tower::Service<Request> for RateLimitService<S>
where
    S: tower::Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let bucket = self.bucket.clone();
        let mut service = self.service.clone();

        Box::pin(async move {
            if let Some(bucket) = bucket {
                loop {
                    // Guard dropped at the end of the statement, before sleeping.
                    let wait = bucket.lock().await.take();
                    match wait {
                        None => break,
                        Some(wait) => tokio::time::sleep(wait).await,
                    }
                }
            }

            service.call(request).await
        })
    }
}
