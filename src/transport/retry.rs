// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Retry with exponential backoff for ledger RPC calls.
//!
//! A backfill issues one `get_block` per record, so a single dropped
//! connection would otherwise end the walk early. Transient transport
//! failures are retried here, below the source's own timeout; node-side
//! errors such as assertion failures are returned immediately.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use alloy_json_rpc::{RequestPacket, ResponsePacket, RpcError};
use alloy_transport::TransportError;
use tower::Layer;
use tracing::{debug, warn};

use crate::config::constants::{DEFAULT_MAX_RETRIES, RETRY_BASE_DELAY, RETRY_MAX_DELAY};

/// Retry policy.
///
/// The delay before retry `n` (0-based) is `min(base_delay * 2^n, max_delay)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: RETRY_BASE_DELAY,
            max_delay: RETRY_MAX_DELAY,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// A Tower layer that retries transient ledger failures.
///
/// ```rust
/// use blockvault::transport::RetryLayer;
/// use std::time::Duration;
///
/// let layer = RetryLayer::builder()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(250))
///     .build();
/// assert_eq!(layer.config().max_retries, 5);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

impl RetryLayer {
    /// Default policy: 3 retries, 100ms base delay, 30s cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default delays with a custom retry count.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self::builder().max_retries(max_retries).build()
    }

    pub fn builder() -> RetryLayerBuilder {
        RetryLayerBuilder::default()
    }

    /// The policy this layer applies.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RetryService {
            service,
            config: self.config.clone(),
        }
    }
}

/// Builder for a [`RetryLayer`].
#[derive(Clone, Debug, Default)]
pub struct RetryLayerBuilder {
    config: RetryConfig,
}

impl RetryLayerBuilder {
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    pub fn build(self) -> RetryLayer {
        RetryLayer {
            config: Arc::new(self.config),
        }
    }
}

/// A Tower service that re-sends a request after transient failures.
#[derive(Clone, Debug)]
pub struct RetryService<S> {
    service: S,
    config: Arc<RetryConfig>,
}

impl<S> tower::Service<RequestPacket> for RetryService<S>
where
    S: tower::Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let mut attempt = 0u32;
            loop {
                let error = match service.clone().call(request.clone()).await {
                    Ok(response) => {
                        if attempt > 0 {
                            debug!(retries = attempt, "Ledger call succeeded after retry");
                        }
                        return Ok(response);
                    }
                    Err(error) => error,
                };

                if !is_retryable(&error) {
                    return Err(error);
                }
                if attempt >= config.max_retries {
                    warn!(error = %error, attempts = attempt + 1, "Giving up on ledger call");
                    return Err(error);
                }

                let delay = config.backoff(attempt);
                debug!(
                    error = %error,
                    retry = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Transient ledger failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        })
    }
}

/// Whether a failed call may succeed if sent again.
///
/// Connection failures, HTTP 5xx/429 and garbled or empty responses are
/// retried. Request serialization errors and node error responses (other than
/// those the node marks as retryable) are not.
fn is_retryable(error: &TransportError) -> bool {
    match error {
        RpcError::Transport(kind) => kind.is_retry_err(),
        RpcError::ErrorResp(payload) => payload.is_retry_err(),
        RpcError::DeserError { .. } | RpcError::NullResp => true,
        _ => false,
    }
}
