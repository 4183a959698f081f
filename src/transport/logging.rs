// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based logging layer for ledger RPC calls.
//!
//! Graphene nodes expose every API through a single `call` method whose params
//! are `[api, method, args]`. Logging the JSON-RPC method alone would print
//! `call` for everything, so this layer names requests after the inner API
//! method instead (`database.get_block`).

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use alloy_json_rpc::{RequestPacket, ResponsePacket, SerializedRequest};
use alloy_transport::TransportError;
use serde::de::IgnoredAny;
use tower::Layer;
use tracing::{debug, trace, warn, Instrument};

/// A Tower layer that records each ledger call in a tracing span.
///
/// Timing and failures are always logged; request and response bodies only
/// when enabled, since block payloads can be large.
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    log_payloads: bool,
}

impl LoggingLayer {
    /// Creates a logging layer that records timing and errors only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also logs full request and response packets at TRACE level.
    pub fn with_payloads(mut self) -> Self {
        self.log_payloads = true;
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        LoggingService {
            service,
            log_payloads: self.log_payloads,
        }
    }
}

/// A Tower service that logs ledger calls.
#[derive(Clone, Debug)]
pub struct LoggingService<S> {
    service: S,
    log_payloads: bool,
}

impl<S> tower::Service<RequestPacket> for LoggingService<S>
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
        let log_payloads = self.log_payloads;
        let mut service = self.service.clone();
        let method = describe_packet(&request);

        let span = tracing::debug_span!(
            "blockvault.ledger_call",
            method = %method,
            duration_ms = tracing::field::Empty,
        );

        Box::pin(
            async move {
                if log_payloads {
                    trace!(request = ?request, "Ledger request");
                }

                let start = Instant::now();
                let result = service.call(request).await;
                let elapsed_ms = start.elapsed().as_millis() as u64;
                tracing::Span::current().record("duration_ms", elapsed_ms);

                match &result {
                    Ok(response) if log_payloads => {
                        trace!(response = ?response, elapsed_ms, "Ledger response");
                    }
                    Ok(_) => debug!(elapsed_ms, "Ledger call completed"),
                    Err(e) => warn!(error = %e, elapsed_ms, "Ledger call failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Names a request packet for logging.
fn describe_packet(packet: &RequestPacket) -> String {
    match packet {
        RequestPacket::Single(request) => describe_request(request),
        RequestPacket::Batch(requests) => match requests.as_slice() {
            [] => "batch(empty)".to_string(),
            [only] => describe_request(only),
            many => format!("batch({} calls)", many.len()),
        },
    }
}

/// `database.get_block` for Graphene `call` envelopes, the raw method otherwise.
fn describe_request(request: &SerializedRequest) -> String {
    if request.method() != "call" {
        return request.method().to_string();
    }

    request
        .params()
        .and_then(|params| {
            serde_json::from_str::<(String, String, IgnoredAny)>(params.get()).ok()
        })
        .map(|(api, method, _)| format!("{api}.{method}"))
        .unwrap_or_else(|| "call".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_rpc::{Id, Request};
    use serde_json::json;

    fn serialized(method: &'static str, params: serde_json::Value) -> SerializedRequest {
        Request::new(method, Id::Number(1), params)
            .serialize()
            .unwrap()
    }

    #[test]
    fn test_describes_graphene_call_envelope() {
        let request = serialized("call", json!(["database", "get_block", [42]]));
        assert_eq!(describe_request(&request), "database.get_block");
    }

    #[test]
    fn test_falls_back_to_raw_method() {
        let request = serialized("get_chain_id", json!([]));
        assert_eq!(describe_request(&request), "get_chain_id");

        let malformed = serialized("call", json!({ "api": "database" }));
        assert_eq!(describe_request(&malformed), "call");
    }

    #[test]
    fn test_describes_batches() {
        let batch = RequestPacket::Batch(vec![
            serialized("call", json!(["database", "get_block", [1]])),
            serialized("call", json!(["database", "get_block", [2]])),
        ]);
        assert_eq!(describe_packet(&batch), "batch(2 calls)");
    }

    #[test]
    fn test_logging_layer_payload_toggle() {
        assert!(!LoggingLayer::new().log_payloads);
        assert!(LoggingLayer::new().with_payloads().log_payloads);
    }
}
