// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cache-backed block reads
//!
//! Reads are served from the store first. Only ids the store is missing are
//! fetched from the ledger, concurrently, and written back so the next read of
//! the same range touches the ledger not at all.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn, Instrument, Span};

use crate::errors::ReadError;
use crate::source::LedgerSource;
use crate::spans;
use crate::store::{InsertOutcome, RecordStore};
use crate::types::ids::{RecordId, RecordRange};
use crate::types::record::{Payload, Record};

/// Serves single blocks and block ranges through the store
///
/// # Examples
///
/// ```rust,ignore
/// use blockvault::{RangeReader, RecordId, RecordRange};
///
/// let reader = RangeReader::new(source, store);
/// let blocks = reader
///     .read_range(RecordRange::new(RecordId::new(100), 10)?)
///     .await?;
/// assert!(blocks.windows(2).all(|w| w[0].id() < w[1].id()));
/// ```
#[derive(Clone)]
pub struct RangeReader {
    source: Arc<dyn LedgerSource>,
    store: Arc<dyn RecordStore>,
}

impl RangeReader {
    pub fn new(source: Arc<dyn LedgerSource>, store: Arc<dyn RecordStore>) -> Self {
        Self { source, store }
    }

    /// Reads every existing block in `range`, ascending by id
    ///
    /// Ids above the ledger head are left out, so a range that runs past the
    /// head comes back short. Block 0 is skipped the same way. Everything
    /// else at or below the head must exist.
    ///
    /// # Errors
    ///
    /// - [`ReadError::NotFound`] for the range start if no block in the range
    ///   exists, or for a missing id at or below the head
    /// - [`ReadError::Source`] if the ledger cannot be reached
    /// - [`ReadError::Store`] if the cached part cannot be read
    pub async fn read_range(&self, range: RecordRange) -> Result<Vec<Record>, ReadError> {
        async move {
            let cached = self
                .store
                .find_by_id_range(range.first(), range.last())
                .await?;

            let gaps = compute_gaps(range, &cached);
            Span::current().record("gaps", gaps.len());

            let Some(&highest_gap) = gaps.last() else {
                return non_empty(range, cached);
            };

            let head = self.head_bound(highest_gap).await?;
            let fetchable: Vec<RecordId> =
                gaps.into_iter().filter(|id| id.get() <= head).collect();

            if fetchable.is_empty() {
                return non_empty(range, cached);
            }

            debug!(
                cached = cached.len(),
                fetching = fetchable.len(),
                head,
                "Filling range gaps from ledger"
            );

            let fetched = join_all(fetchable.into_iter().map(|id| self.fetch_existing(id)))
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

            self.write_back(&fetched).await;

            Ok(merge(cached, fetched))
        }
        .instrument(spans::read_range(range))
        .await
    }

    /// Reads one block's payload
    ///
    /// # Errors
    ///
    /// [`ReadError::NotFound`] if the ledger does not have the block.
    pub async fn read_one(&self, id: RecordId) -> Result<Payload, ReadError> {
        async move {
            if let Some(record) = self.store.find_by_id(id).await? {
                return Ok(record.into_payload());
            }

            let record = self.fetch_existing(id).await?;
            self.write_back(std::slice::from_ref(&record)).await;
            Ok(record.into_payload())
        }
        .instrument(spans::read_one(id))
        .await
    }

    /// Highest block id worth fetching
    ///
    /// The stored head is good enough when it already covers `highest_gap`;
    /// otherwise the ledger is asked.
    async fn head_bound(&self, highest_gap: RecordId) -> Result<u64, ReadError> {
        match self.store.head().await {
            Ok(Some(head)) if head.head_block_number() >= highest_gap.get() => {
                return Ok(head.head_block_number());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to read stored head, asking ledger"),
        }

        Ok(self.source.fetch_head().await?.head_block_number())
    }

    async fn fetch_existing(&self, id: RecordId) -> Result<Record, ReadError> {
        self.source
            .fetch_record(id)
            .await?
            .ok_or_else(|| ReadError::record_not_found(id))
    }

    /// Stores fetched blocks; failures are logged and do not fail the read
    async fn write_back(&self, records: &[Record]) {
        let results = join_all(
            records
                .iter()
                .map(|record| self.store.insert_if_absent(record)),
        )
        .await;

        for (record, result) in records.iter().zip(results) {
            match result {
                Ok(InsertOutcome::Inserted) | Ok(InsertOutcome::AlreadyPresent) => {}
                Err(e) => warn!(
                    record_id = %record.id(),
                    error = %e,
                    "Failed to cache fetched block"
                ),
            }
        }
    }
}

impl std::fmt::Debug for RangeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeReader")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

/// Ids in `range` that are not in `cached`, ascending
///
/// Block 0 never exists upstream, so it is never a gap.
fn compute_gaps(range: RecordRange, cached: &[Record]) -> Vec<RecordId> {
    let present: BTreeSet<RecordId> = cached.iter().map(Record::id).collect();
    range
        .iter()
        .filter(|id| *id >= RecordId::FIRST && !present.contains(id))
        .collect()
}

fn non_empty(range: RecordRange, records: Vec<Record>) -> Result<Vec<Record>, ReadError> {
    if records.is_empty() {
        Err(ReadError::record_not_found(range.first()))
    } else {
        Ok(records)
    }
}

/// Single ascending, duplicate-free sequence
fn merge(cached: Vec<Record>, fetched: Vec<Record>) -> Vec<Record> {
    let mut merged = cached;
    merged.extend(fetched);
    merged.sort_by_key(Record::id);
    merged.dedup_by_key(|record| record.id());
    merged
}
