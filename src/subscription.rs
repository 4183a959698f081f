// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Following the ledger head

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn, Instrument};

use crate::errors::SourceError;
use crate::head::HeadTracker;
use crate::ingest::{BackfillWalker, BlockIngestor, IngestMode, WalkSummary};
use crate::source::LedgerSource;
use crate::spans;
use crate::store::RecordStore;
use crate::types::head::HeadSnapshot;
use crate::types::ids::RecordId;

/// Turns head-advance notifications into backfill walks
///
/// Notifications are handled one at a time in arrival order. Each one
/// refreshes the stored head, then walks forward from the store frontier in
/// live mode. A notification that arrives while nothing is missing costs one
/// absent-block fetch.
#[derive(Clone)]
pub struct ChainSubscription {
    source: Arc<dyn LedgerSource>,
    store: Arc<dyn RecordStore>,
    tracker: HeadTracker,
    walker: BackfillWalker,
}

impl ChainSubscription {
    pub fn new(source: Arc<dyn LedgerSource>, ingestor: Arc<BlockIngestor>) -> Self {
        let store = ingestor.store().clone();
        Self {
            tracker: HeadTracker::new(source.clone(), store.clone()),
            walker: BackfillWalker::new(ingestor),
            source,
            store,
        }
    }

    /// Subscribes and follows the head in a background task
    ///
    /// # Errors
    ///
    /// If the ledger refuses the subscription.
    pub async fn start(self) -> Result<SubscriptionHandle, SourceError> {
        self.spawn(false).await
    }

    /// Like [`start`](Self::start), but first walks the whole backlog from
    /// the store frontier
    ///
    /// The subscription is established before the backlog walk so connection
    /// problems surface immediately; notifications are consumed only once the
    /// walk has caught up.
    pub async fn start_with_backfill(self) -> Result<SubscriptionHandle, SourceError> {
        self.spawn(true).await
    }

    async fn spawn(self, backfill: bool) -> Result<SubscriptionHandle, SourceError> {
        let mut advances = self.source.subscribe().await?;
        info!(backfill, store = self.store.name(), "Following ledger head");

        let task = tokio::spawn(async move {
            if backfill {
                match self.walker.walk_from_frontier(IngestMode::Backlog).await {
                    Ok(summary) => info!(%summary, "Backlog walk complete"),
                    Err(e) => warn!(error = %e, "Could not read store frontier, skipping backlog"),
                }
            }

            while let Some(head) = advances.next().await {
                self.handle_advance(head).await;
            }

            info!("Head subscription ended");
        });

        Ok(SubscriptionHandle { task })
    }

    /// Handles one head advance
    ///
    /// Walks from the store frontier, which read write-backs may have moved
    /// past unstored ids. Returns `None` if the frontier could not be read.
    pub async fn handle_advance(&self, notified: HeadSnapshot) -> Option<WalkSummary> {
        let span = spans::head_advance(notified.head_block_number());
        async move {
            let head = match self.tracker.refresh().await {
                Ok(head) => head,
                Err(e) => {
                    warn!(error = %e, "Head refresh failed, using notified head");
                    notified
                }
            };

            let next = match self.store.last_id().await {
                Ok(Some(last)) => last.next().unwrap_or(last),
                // Nothing stored yet: follow from the head, history is
                // filled on demand by reads or a backfill.
                Ok(None) => RecordId::new(head.head_block_number()),
                Err(e) => {
                    warn!(error = %e, "Could not read store frontier");
                    return None;
                }
            };

            Some(self.walker.walk(next, IngestMode::Live).await)
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ChainSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSubscription")
            .field("store", &self.store.name())
            .field("walker", &self.walker)
            .finish_non_exhaustive()
    }
}

/// Running subscription task
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Waits for the subscription stream to end
    pub async fn wait(&mut self) -> Result<(), JoinError> {
        (&mut self.task).await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task, abandoning any walk in progress
    ///
    /// Stored blocks stay stored; the next walk resumes from the frontier.
    pub async fn shutdown(self) {
        self.task.abort();
        match self.task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => info!("Head subscription stopped"),
            Err(e) => warn!(error = %e, "Head subscription task failed"),
        }
    }
}
