// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Head pointer tracking

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn, Instrument};

use crate::errors::{SourceError, StoreError};
use crate::source::LedgerSource;
use crate::spans;
use crate::store::RecordStore;
use crate::types::head::HeadSnapshot;

/// Keeps the store's head snapshot in step with the ledger
///
/// The stored snapshot is telemetry: nothing on the ingest or read path
/// depends on it being current, so failing to persist it is logged and
/// otherwise ignored.
#[derive(Clone)]
pub struct HeadTracker {
    source: Arc<dyn LedgerSource>,
    store: Arc<dyn RecordStore>,
}

impl HeadTracker {
    pub fn new(source: Arc<dyn LedgerSource>, store: Arc<dyn RecordStore>) -> Self {
        Self { source, store }
    }

    /// Fetches the current head and stores it
    ///
    /// Returns the fetched snapshot even when storing it fails.
    ///
    /// # Errors
    ///
    /// Only if the fetch itself fails.
    pub async fn refresh(&self) -> Result<HeadSnapshot, SourceError> {
        async move {
            let head = self.source.fetch_head().await?;

            match self.store.upsert_head(&head).await {
                Ok(()) => debug!(
                    head = head.head_block_number(),
                    lag_secs = ?head.age(Utc::now().naive_utc()).map(|lag| lag.num_seconds()),
                    "Head snapshot stored"
                ),
                Err(e) => warn!(
                    head = head.head_block_number(),
                    error = %e,
                    "Failed to store head snapshot"
                ),
            }

            Ok(head)
        }
        .instrument(spans::refresh_head())
        .await
    }

    /// The last stored snapshot, without contacting the ledger
    pub async fn cached(&self) -> Result<Option<HeadSnapshot>, StoreError> {
        self.store.head().await
    }
}

impl std::fmt::Debug for HeadTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadTracker")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}
