// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cache-backed block ingestion and retrieval for Graphene-style ledgers.
//!
//! blockvault keeps a local, persistent copy of a remote ledger's blocks. New
//! blocks are picked up as the head advances, the backlog between the store
//! and the head is walked on demand, and range reads are answered from the
//! store, fetching only the blocks it is missing.
//!
//! # Components
//!
//! - [`RecordStore`]: persistent cache ([`DiskStore`], [`MemoryStore`])
//! - [`LedgerSource`]: remote ledger access ([`RpcLedgerSource`])
//! - [`BlockIngestor`] and [`BackfillWalker`]: idempotent ingestion
//! - [`HeadTracker`] and [`ChainSubscription`]: following the head
//! - [`RangeReader`]: gap-filling reads
//! - [`ExplorerService`]: validated boundary operations over all of the above,
//!   plus uncached account and witness lookups
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use blockvault::{DiskStore, ExplorerService, RpcLedgerSource, SourceConfig};
//! use std::sync::Arc;
//!
//! let source = RpcLedgerSource::new(SourceConfig::new("https://node.example.com/rpc"))?;
//! let store = DiskStore::open("data/blocks.jsonl").await?;
//! let service = ExplorerService::new(Arc::new(source), Arc::new(store));
//!
//! // Fill the store up to the current head
//! let summary = service.trigger_one_shot_backfill().await?;
//! println!("{summary}");
//!
//! // Served from the store
//! let blocks = service.get_record_range("1", "100").await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod errors;
mod head;
mod ingest;
mod reader;
mod service;
pub mod source;
mod spans;
pub mod store;
mod subscription;
pub mod transport;
pub mod types;

pub use config::{BackfillMode, BlockvaultConfig, BlockvaultConfigBuilder};
pub use errors::{
    BlockvaultError, ConfigError, ErrorStatus, IngestError, ReadError, SourceError, StoreError,
    ValidationError,
};
pub use head::HeadTracker;
pub use ingest::{
    BackfillWalker, BlockIngestor, BroadcastHook, IngestHook, IngestMode, IngestOutcome,
    StatusLine, WalkStop, WalkSummary,
};
pub use reader::RangeReader;
pub use service::{ExplorerService, ServiceOptions};
pub use source::{HeadStream, LedgerApi, LedgerSource, RpcLedgerSource, SourceConfig};
pub use store::{DiskStore, InsertOutcome, MemoryStore, RecordStore, StoreStats};
pub use subscription::{ChainSubscription, SubscriptionHandle};
pub use types::account::AccountRef;
pub use types::head::{HeadSnapshot, InvalidHeadSnapshot};
pub use types::header::{RecordHeader, HEADER_EXCLUDED_FIELDS};
pub use types::ids::{parse_limit, ObjectId, RecordId, RecordRange};
pub use types::record::{Payload, Record};
