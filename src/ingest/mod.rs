// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block ingestion
//!
//! [`BlockIngestor`] moves one block from the ledger into the store,
//! idempotently. [`BackfillWalker`] drives it forward until the ledger has
//! nothing newer. Hooks observe newly inserted blocks; [`BroadcastHook`] turns
//! them into a live feed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, trace, Instrument};

use crate::config::constants::DEFAULT_STATUS_INTERVAL;
use crate::errors::IngestError;
use crate::source::LedgerSource;
use crate::spans;
use crate::store::{InsertOutcome, RecordStore};
use crate::types::ids::RecordId;
use crate::types::record::Record;

mod broadcast;
mod walker;

pub use broadcast::BroadcastHook;
pub use walker::{BackfillWalker, WalkStop, WalkSummary};

/// Whether an ingest is catching up on history or following the head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Following head-advance notifications
    Live,
    /// Walking through blocks produced before this process caught up
    Backlog,
}

impl IngestMode {
    pub fn is_backlog(self) -> bool {
        matches!(self, Self::Backlog)
    }
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Live => "live",
            Self::Backlog => "backlog",
        })
    }
}

/// Result of one [`BlockIngestor::ingest`] call
#[derive(Debug)]
pub enum IngestOutcome {
    /// The block was fetched and newly stored
    Inserted(Record),
    /// The block was fetched but the store already had it
    AlreadyStored(Record),
    /// The ledger has no block with this id yet
    AlreadyCaughtUp,
    /// Fetching or storing failed
    Failed(IngestError),
}

/// Periodic ingestion progress report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Block that triggered the report
    pub record_id: RecordId,
    /// Blocks inserted by this ingestor so far
    pub inserted_total: u64,
    /// Whether the block was ingested while catching up
    pub backlog: bool,
    /// The block's own `timestamp` field, when it has one
    pub timestamp: Option<String>,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {} added", self.record_id)?;
        if let Some(timestamp) = &self.timestamp {
            write!(f, " ({timestamp})")?;
        }
        write!(f, ", {} inserted", self.inserted_total)?;
        if self.backlog {
            f.write_str(" [backlog]")?;
        }
        Ok(())
    }
}

/// Observer of ingestion events
///
/// Both methods default to doing nothing. They run inline on the ingest path,
/// so implementations must not block.
pub trait IngestHook: Send + Sync {
    /// Called once for every block newly inserted into the store
    fn on_record_inserted(&self, _record: &Record, _mode: IngestMode) {}

    /// Called whenever a status line is emitted
    fn on_status(&self, _status: &StatusLine) {}
}

/// Fetches single blocks and stores them idempotently
///
/// The ingestor owns the inserted-block counter that paces status lines; share
/// one ingestor (behind an `Arc`) between everything that ingests so the
/// cadence is global.
///
/// # Examples
///
/// ```rust,ignore
/// use blockvault::{BlockIngestor, IngestMode, IngestOutcome, RecordId};
///
/// let ingestor = BlockIngestor::new(source, store).with_status_interval(1000);
/// match ingestor.ingest(RecordId::new(42), IngestMode::Live).await {
///     IngestOutcome::Inserted(block) => println!("stored {}", block.id()),
///     IngestOutcome::AlreadyStored(_) => {}
///     IngestOutcome::AlreadyCaughtUp => println!("not produced yet"),
///     IngestOutcome::Failed(e) => eprintln!("{e}"),
/// }
/// ```
pub struct BlockIngestor {
    source: Arc<dyn LedgerSource>,
    store: Arc<dyn RecordStore>,
    hooks: Vec<Arc<dyn IngestHook>>,
    status_interval: u64,
    inserted: AtomicU64,
}

impl BlockIngestor {
    pub fn new(source: Arc<dyn LedgerSource>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            source,
            store,
            hooks: Vec::new(),
            status_interval: DEFAULT_STATUS_INTERVAL,
            inserted: AtomicU64::new(0),
        }
    }

    /// Emit a status line every `interval` inserted blocks (minimum 1)
    pub fn with_status_interval(mut self, interval: u64) -> Self {
        self.status_interval = interval.max(1);
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn IngestHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Blocks newly inserted by this ingestor
    pub fn inserted_count(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Fetches block `id` and inserts it unless already stored
    ///
    /// Never returns an error directly; failures come back as
    /// [`IngestOutcome::Failed`] so walkers can decide what to do.
    pub async fn ingest(&self, id: RecordId, mode: IngestMode) -> IngestOutcome {
        async move {
            let record = match self.source.fetch_record(id).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    trace!("Ledger has no such block yet");
                    return IngestOutcome::AlreadyCaughtUp;
                }
                Err(e) => return IngestOutcome::Failed(e.into()),
            };

            match self.store.insert_if_absent(&record).await {
                Ok(InsertOutcome::Inserted) => {
                    self.after_insert(&record, mode);
                    IngestOutcome::Inserted(record)
                }
                Ok(InsertOutcome::AlreadyPresent) => IngestOutcome::AlreadyStored(record),
                Err(e) => IngestOutcome::Failed(e.into()),
            }
        }
        .instrument(spans::ingest_record(id, mode))
        .await
    }

    fn after_insert(&self, record: &Record, mode: IngestMode) {
        let total = self.inserted.fetch_add(1, Ordering::Relaxed) + 1;

        for hook in &self.hooks {
            hook.on_record_inserted(record, mode);
        }

        if total % self.status_interval != 0 {
            return;
        }

        let status = StatusLine {
            record_id: record.id(),
            inserted_total: total,
            backlog: mode.is_backlog(),
            timestamp: record
                .payload()
                .get("timestamp")
                .and_then(|t| t.as_str())
                .map(str::to_string),
        };

        info!(
            record_id = %status.record_id,
            inserted_total = status.inserted_total,
            backlog = status.backlog,
            "{status}"
        );

        for hook in &self.hooks {
            hook.on_status(&status);
        }
    }
}

impl fmt::Debug for BlockIngestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockIngestor")
            .field("store", &self.store.name())
            .field("hooks", &self.hooks.len())
            .field("status_interval", &self.status_interval)
            .field("inserted", &self.inserted_count())
            .finish()
    }
}
