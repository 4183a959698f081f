// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Sequential forward walk over ledger blocks

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn, Instrument, Span};

use super::{BlockIngestor, IngestMode, IngestOutcome};
use crate::errors::StoreError;
use crate::spans;
use crate::types::ids::RecordId;

/// Why a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkStop {
    /// The ledger had no block at `next_id`
    CaughtUp,
    /// Ingesting `at` failed; the walk does not retry it
    Failed { at: RecordId, reason: String },
}

/// What a walk did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    /// First id attempted
    pub start: RecordId,
    /// First id not ingested; where the next walk should begin
    pub next_id: RecordId,
    /// Blocks newly stored
    pub inserted: u64,
    /// Blocks fetched but already stored
    pub already_stored: u64,
    pub stop: WalkStop,
}

impl WalkSummary {
    pub fn caught_up(&self) -> bool {
        self.stop == WalkStop::CaughtUp
    }

    /// Blocks fetched during the walk, new or not
    pub fn processed(&self) -> u64 {
        self.inserted + self.already_stored
    }
}

impl fmt::Display for WalkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "walked {}..{}: {} inserted, {} already stored",
            self.start, self.next_id, self.inserted, self.already_stored
        )?;
        match &self.stop {
            WalkStop::CaughtUp => f.write_str(", caught up"),
            WalkStop::Failed { at, reason } => write!(f, ", stopped at {at}: {reason}"),
        }
    }
}

/// Drives a [`BlockIngestor`] from a starting id until the ledger runs out
///
/// The walk is a plain loop that yields to the scheduler between blocks, so a
/// backlog of millions of blocks neither grows the stack nor starves other
/// tasks. It stops at the first absent block (caught up) or the first failure;
/// either way the store frontier tells the next walk where to resume.
#[derive(Debug, Clone)]
pub struct BackfillWalker {
    ingestor: Arc<BlockIngestor>,
}

impl BackfillWalker {
    pub fn new(ingestor: Arc<BlockIngestor>) -> Self {
        Self { ingestor }
    }

    /// The block after the highest stored one, or the first block when empty
    ///
    /// The frontier is the highest stored id, not the end of the contiguous
    /// prefix. A read that writes back a block beyond the walked part moves
    /// it forward, and the ids it skips over stay unstored until a read
    /// fills them. Use [`BackfillWalker::walk`] from an explicit id to close
    /// such holes.
    pub async fn start_id(&self) -> Result<RecordId, StoreError> {
        Ok(match self.ingestor.store().last_id().await? {
            Some(last) => last.next().unwrap_or(last),
            None => RecordId::FIRST,
        })
    }

    /// Walks from the store frontier
    ///
    /// Starts at [`BackfillWalker::start_id`], so holes below the highest
    /// stored block are not revisited.
    pub async fn walk_from_frontier(&self, mode: IngestMode) -> Result<WalkSummary, StoreError> {
        let start = self.start_id().await?;
        Ok(self.walk(start, mode).await)
    }

    /// Ingests `start`, `start + 1`, ... until caught up or failed
    pub async fn walk(&self, start: RecordId, mode: IngestMode) -> WalkSummary {
        async move {
            let mut inserted = 0;
            let mut already_stored = 0;
            let mut id = start;

            let stop = loop {
                match self.ingestor.ingest(id, mode).await {
                    IngestOutcome::Inserted(_) => inserted += 1,
                    IngestOutcome::AlreadyStored(_) => already_stored += 1,
                    IngestOutcome::AlreadyCaughtUp => break WalkStop::CaughtUp,
                    IngestOutcome::Failed(e) => {
                        warn!(record_id = %id, error = %e, "Ingest failed, stopping walk");
                        break WalkStop::Failed {
                            at: id,
                            reason: e.to_string(),
                        };
                    }
                }

                let Some(next) = id.next() else {
                    break WalkStop::CaughtUp;
                };
                id = next;
                tokio::task::yield_now().await;
            };

            Span::current().record("next_id", id.get());

            let summary = WalkSummary {
                start,
                next_id: id,
                inserted,
                already_stored,
                stop,
            };

            if summary.processed() > 0 {
                info!(
                    inserted = summary.inserted,
                    already_stored = summary.already_stored,
                    caught_up = summary.caught_up(),
                    "Backfill walk finished"
                );
            }

            summary
        }
        .instrument(spans::backfill_walk(start, mode))
        .await
    }
}
