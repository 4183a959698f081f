// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Boundary operations
//!
//! [`ExplorerService`] is the one object a transport layer (HTTP routes, a
//! socket server, a CLI) needs. It takes raw string input, validates it before
//! any I/O, and wires the ingestor, walker, head tracker and reader around a
//! shared store and ledger source.
//!
//! Account and witness lookups live in `queries`; they go straight to the
//! ledger and are never cached.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use crate::config::constants::{
    DEFAULT_BROADCAST_CAPACITY, DEFAULT_MAX_RANGE_LIMIT, DEFAULT_STATUS_INTERVAL, HEAD_OBJECT_ID,
};
use crate::config::BlockvaultConfig;
use crate::errors::{ReadError, SourceError, StoreError, ValidationError};
use crate::head::HeadTracker;
use crate::ingest::{BackfillWalker, BlockIngestor, BroadcastHook, IngestMode, WalkSummary};
use crate::reader::RangeReader;
use crate::source::LedgerSource;
use crate::store::{RecordStore, StoreStats};
use crate::subscription::{ChainSubscription, SubscriptionHandle};
use crate::types::head::HeadSnapshot;
use crate::types::header::RecordHeader;
use crate::types::ids::{parse_limit, ObjectId, RecordId, RecordRange};
use crate::types::record::{Payload, Record};

mod queries;

/// Tunables for [`ExplorerService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Newly inserted blocks between ingestion status lines
    pub status_interval: u64,
    /// Largest accepted range-read limit
    pub max_range_limit: u64,
    /// Capacity of the live block broadcast
    pub broadcast_capacity: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            status_interval: DEFAULT_STATUS_INTERVAL,
            max_range_limit: DEFAULT_MAX_RANGE_LIMIT,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl From<&BlockvaultConfig> for ServiceOptions {
    fn from(config: &BlockvaultConfig) -> Self {
        Self {
            status_interval: config.status_interval,
            max_range_limit: config.max_range_limit,
            broadcast_capacity: config.broadcast_capacity,
        }
    }
}

/// Block explorer backend: cached reads, backfill and live following
///
/// Create one per process and share it; all state lives behind `Arc`s, so
/// concurrent calls are fine.
///
/// # Examples
///
/// ```rust,ignore
/// use blockvault::{ErrorStatus, ExplorerService, MemoryStore};
/// use std::sync::Arc;
///
/// let service = ExplorerService::new(source, Arc::new(MemoryStore::new()));
///
/// let blocks = service.get_record_range("1000", "20").await?;
/// let err = service.get_single_record("abc").await.unwrap_err();
/// assert_eq!(err.status(), ErrorStatus::BadRequest);
/// ```
pub struct ExplorerService {
    source: Arc<dyn LedgerSource>,
    store: Arc<dyn RecordStore>,
    ingestor: Arc<BlockIngestor>,
    walker: BackfillWalker,
    tracker: HeadTracker,
    reader: RangeReader,
    broadcast: BroadcastHook,
    options: ServiceOptions,
}

impl ExplorerService {
    pub fn new(source: Arc<dyn LedgerSource>, store: Arc<dyn RecordStore>) -> Self {
        Self::with_options(source, store, ServiceOptions::default())
    }

    pub fn with_options(
        source: Arc<dyn LedgerSource>,
        store: Arc<dyn RecordStore>,
        options: ServiceOptions,
    ) -> Self {
        let broadcast = BroadcastHook::new(options.broadcast_capacity);
        let ingestor = Arc::new(
            BlockIngestor::new(source.clone(), store.clone())
                .with_status_interval(options.status_interval)
                .with_hook(Arc::new(broadcast.clone())),
        );

        Self {
            walker: BackfillWalker::new(ingestor.clone()),
            tracker: HeadTracker::new(source.clone(), store.clone()),
            reader: RangeReader::new(source.clone(), store.clone()),
            source,
            store,
            ingestor,
            broadcast,
            options,
        }
    }

    /// Full block `id`, from the store or the ledger
    pub async fn get_single_record(&self, id: &str) -> Result<Payload, ReadError> {
        let id = RecordId::parse(id)?;
        self.reader.read_one(id).await
    }

    /// Blocks `[start, start + limit)` that exist, ascending
    ///
    /// `limit` must be between 1 and the configured maximum.
    pub async fn get_record_range(
        &self,
        start: &str,
        limit: &str,
    ) -> Result<Vec<Record>, ReadError> {
        let start = RecordId::parse(start)?;
        let limit = parse_limit(limit)?;
        if limit > self.options.max_range_limit {
            return Err(ValidationError::LimitTooLarge {
                limit,
                max: self.options.max_range_limit,
            }
            .into());
        }

        let range = RecordRange::new(start, limit)?;
        self.reader.read_range(range).await
    }

    /// Block `id` without transactions and witness signature
    pub async fn get_single_record_header(&self, id: &str) -> Result<RecordHeader, ReadError> {
        self.get_single_record(id)
            .await
            .map(RecordHeader::from_payload)
    }

    /// Any ledger object by dotted id (`1.6.5`, `1.11.300`, ...), uncached
    pub async fn get_object(&self, id: &str) -> Result<Value, ReadError> {
        let id = ObjectId::parse(id)?;
        self.source
            .fetch_object(&id)
            .await?
            .ok_or_else(|| ReadError::object_not_found(id))
    }

    /// The stored head snapshot, without contacting the ledger
    pub async fn get_cached_head(&self) -> Result<HeadSnapshot, ReadError> {
        self.tracker
            .cached()
            .await?
            .ok_or_else(|| ReadError::object_not_found(HEAD_OBJECT_ID))
    }

    /// Walks from the store frontier until caught up, then returns
    ///
    /// # Errors
    ///
    /// Only if the store frontier cannot be read; ingestion failures end the
    /// walk and are reported in the summary.
    pub async fn trigger_one_shot_backfill(&self) -> Result<WalkSummary, StoreError> {
        if let Err(e) = self.tracker.refresh().await {
            warn!(error = %e, "Head refresh failed before backfill");
        }
        self.walker.walk_from_frontier(IngestMode::Backlog).await
    }

    /// Walks the backlog, then follows the head until shut down
    pub async fn trigger_continuous_backfill(&self) -> Result<SubscriptionHandle, SourceError> {
        self.subscription().start_with_backfill().await
    }

    /// Follows the head without walking the backlog first
    pub async fn start_live(&self) -> Result<SubscriptionHandle, SourceError> {
        self.subscription().start().await
    }

    /// Every block inserted from now on, by any ingestion path
    pub fn subscribe_records(&self) -> broadcast::Receiver<Record> {
        self.broadcast.subscribe()
    }

    pub async fn store_stats(&self) -> StoreStats {
        self.store.stats().await
    }

    pub fn ingestor(&self) -> &Arc<BlockIngestor> {
        &self.ingestor
    }

    pub fn options(&self) -> ServiceOptions {
        self.options
    }

    fn subscription(&self) -> ChainSubscription {
        ChainSubscription::new(self.source.clone(), self.ingestor.clone())
    }
}

impl std::fmt::Debug for ExplorerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerService")
            .field("store", &self.store.name())
            .field("ingestor", &self.ingestor)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
