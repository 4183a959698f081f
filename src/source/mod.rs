// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Remote ledger access
//!
//! [`LedgerSource`] is the read-only contract the ingestion and read paths
//! depend on. [`RpcLedgerSource`] implements it over a Graphene node's HTTP
//! JSON-RPC API; tests substitute their own implementations.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;

use crate::config::constants::{DATABASE_API, HISTORY_API};
use crate::errors::SourceError;
use crate::types::head::HeadSnapshot;
use crate::types::ids::{ObjectId, RecordId};
use crate::types::record::Record;

mod config;
mod rpc;

pub use config::SourceConfig;
pub use rpc::RpcLedgerSource;

/// Stream of head-advance notifications
pub type HeadStream = Pin<Box<dyn Stream<Item = HeadSnapshot> + Send>>;

/// Node API a pass-through query is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerApi {
    /// Accounts, witnesses, objects and blocks
    Database,
    /// Per-account operation history
    History,
}

impl LedgerApi {
    /// Name used in the `call` envelope
    pub const fn name(self) -> &'static str {
        match self {
            LedgerApi::Database => DATABASE_API,
            LedgerApi::History => HISTORY_API,
        }
    }
}

impl fmt::Display for LedgerApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read access to the remote ledger
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetches one block.
    ///
    /// `Ok(None)` means the ledger has no block with this id, which for ids
    /// past the head means "not produced yet". Callers rely on this to detect
    /// that they have caught up, so it must not be reported as an error.
    async fn fetch_record(&self, id: RecordId) -> Result<Option<Record>, SourceError>;

    /// Fetches the current head snapshot (dynamic global properties).
    async fn fetch_head(&self) -> Result<HeadSnapshot, SourceError>;

    /// Fetches an arbitrary ledger object by dotted id; `Ok(None)` if absent.
    async fn fetch_object(&self, id: &ObjectId) -> Result<Option<Value>, SourceError>;

    /// Issues `method` on `api` with positional `params` and returns the raw
    /// response. Nothing is cached; callers interpret the shape.
    async fn query(
        &self,
        api: LedgerApi,
        method: &'static str,
        params: Value,
    ) -> Result<Value, SourceError>;

    /// Subscribes to head advances.
    ///
    /// Each item is a head snapshot whose block number is higher than any
    /// previously yielded. Errors establishing the subscription are returned
    /// here; the stream itself does not fail.
    async fn subscribe(&self) -> Result<HeadStream, SourceError>;
}
