// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! [`LedgerSource`] over a Graphene node's HTTP JSON-RPC API

use std::future::IntoFuture;
use std::time::Duration;

use alloy_json_rpc::{RpcError, RpcRecv, RpcSend};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::{HeadStream, LedgerApi, LedgerSource, SourceConfig};
use crate::config::constants::HEAD_OBJECT_ID;
use crate::errors::{ConfigError, SourceError};
use crate::transport::{LoggingLayer, RateLimitLayer, RetryLayer};
use crate::types::head::HeadSnapshot;
use crate::types::ids::{ObjectId, RecordId};
use crate::types::record::{Payload, Record};

/// Ledger source backed by a node's `database` and `history` APIs
///
/// Every request goes through `call` with `[api, method, params]` params, wrapped in logging, retry and optional rate limiting layers.
/// Subscriptions poll the head object, since plain HTTP has no push channel.
///
/// Cloning is cheap; clones share the underlying client and rate limit.
///
/// # Examples
///
/// ```rust,ignore
/// use blockvault::{LedgerSource, RpcLedgerSource, SourceConfig};
///
/// let source = RpcLedgerSource::new(
///     SourceConfig::new("https://node.example.com/rpc").with_rate_limit(10),
/// )?;
/// let head = source.fetch_head().await?;
/// println!("head is block {}", head.head_block_number());
/// ```
#[derive(Clone, Debug)]
pub struct RpcLedgerSource {
    client: RpcClient,
    timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedgerSource {
    /// Builds the layered HTTP client for `config.url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse.
    pub fn new(config: SourceConfig) -> Result<Self, ConfigError> {
        let url: url::Url = config
            .url
            .parse()
            .map_err(|e| ConfigError::invalid("LEDGER_RPC_URL", config.url.as_str(), e))?;

        let client = ClientBuilder::default()
            .layer(LoggingLayer::new())
            .layer(RetryLayer::with_max_retries(config.max_retries))
            .layer(RateLimitLayer::from_optional(config.rate_limit_per_second))
            .http(url);

        Ok(Self {
            client,
            timeout: config.timeout,
            poll_interval: config.poll_interval,
        })
    }

    /// Issues `call([api, method, params])` under the configured timeout
    async fn call<P, R>(
        &self,
        api: LedgerApi,
        method: &'static str,
        params: P,
    ) -> Result<R, SourceError>
    where
        P: RpcSend,
        R: RpcRecv,
    {
        let request = self
            .client
            .request::<_, R>("call", (api.name(), method, params))
            .into_future();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e @ RpcError::DeserError { .. })) => {
                Err(SourceError::malformed(method, e.to_string()))
            }
            Ok(Err(e)) => Err(SourceError::unavailable(method, e)),
            Err(_) => Err(SourceError::timeout(method, self.timeout)),
        }
    }

    /// `get_objects` for a single id
    async fn get_object(&self, id: &ObjectId) -> Result<Option<Payload>, SourceError> {
        let mut objects: Vec<Option<Payload>> = self
            .call(LedgerApi::Database, "get_objects", [[id.to_string()]])
            .await?;

        if objects.len() > 1 {
            return Err(SourceError::malformed(
                "get_objects",
                format!("expected 1 object, got {}", objects.len()),
            ));
        }
        Ok(objects.pop().flatten())
    }
}

#[async_trait]
impl LedgerSource for RpcLedgerSource {
    async fn fetch_record(&self, id: RecordId) -> Result<Option<Record>, SourceError> {
        let block: Option<Payload> = self
            .call(LedgerApi::Database, "get_block", [id.get()])
            .await?;
        Ok(block.map(|payload| Record::new(id, payload)))
    }

    async fn fetch_head(&self) -> Result<HeadSnapshot, SourceError> {
        let payload = self.get_object(&HEAD_OBJECT_ID).await?.ok_or_else(|| {
            SourceError::malformed("get_objects", format!("{HEAD_OBJECT_ID} is missing"))
        })?;

        HeadSnapshot::try_from(payload)
            .map_err(|e| SourceError::malformed("get_objects", e.to_string()))
    }

    async fn fetch_object(&self, id: &ObjectId) -> Result<Option<Value>, SourceError> {
        Ok(self.get_object(id).await?.map(Value::Object))
    }

    async fn query(
        &self,
        api: LedgerApi,
        method: &'static str,
        params: Value,
    ) -> Result<Value, SourceError> {
        self.call(api, method, params).await
    }

    async fn subscribe(&self) -> Result<HeadStream, SourceError> {
        // Fails fast if the node is unreachable; also the stream's first item.
        let current = self.fetch_head().await?;

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.reset();

        let poller = HeadPoller {
            source: self.clone(),
            interval,
            last_seen: current.head_block_number(),
        };

        let advances = futures::stream::unfold(poller, |mut poller| async move {
            let head = poller.next_advance().await;
            Some((head, poller))
        });

        Ok(futures::stream::iter([current]).chain(advances).boxed())
    }
}

/// State carried between head polls
struct HeadPoller {
    source: RpcLedgerSource,
    interval: Interval,
    last_seen: u64,
}

impl HeadPoller {
    /// Polls until the head moves past the last yielded block
    async fn next_advance(&mut self) -> HeadSnapshot {
        loop {
            self.interval.tick().await;

            match self.source.fetch_head().await {
                Ok(head) if head.head_block_number() > self.last_seen => {
                    self.last_seen = head.head_block_number();
                    return head;
                }
                Ok(head) => {
                    debug!(head = head.head_block_number(), "Head unchanged");
                }
                Err(e) => {
                    warn!(error = %e, "Head poll failed, retrying next interval");
                }
            }
        }
    }
}
