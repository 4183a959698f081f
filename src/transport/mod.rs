// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower middleware for the ledger's JSON-RPC transport.
//!
//! These layers wrap the HTTP transport underneath
//! [`RpcLedgerSource`](crate::RpcLedgerSource). Layers added first sit
//! outermost, so the usual stack logs each logical call once, retries
//! transient failures inside that span and rate limits every attempt:
//!
//! ```rust,ignore
//! use alloy_rpc_client::ClientBuilder;
//! use blockvault::transport::{LoggingLayer, RateLimitLayer, RetryLayer};
//!
//! let client = ClientBuilder::default()
//!     .layer(LoggingLayer::new())
//!     .layer(RetryLayer::with_max_retries(3))
//!     .layer(RateLimitLayer::per_second(10))
//!     .http(node_url);
//! ```
//!
//! Public Graphene nodes throttle aggressively; a limit of 5-10 requests per
//! second is a reasonable starting point for a full backfill.

mod logging;
mod rate_limit;
mod retry;

pub use logging::{LoggingLayer, LoggingService};
pub use rate_limit::{RateLimitLayer, RateLimitService};
pub use retry::{RetryConfig, RetryLayer, RetryLayerBuilder, RetryService};
