// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for blockvault operations.
//!
//! Telemetry is kept out of the business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a helper here and attaches the
//! span with [`tracing::Instrument`], which stays correct across `.await`.
//!
//! ```rust,ignore
//! pub async fn my_operation(&self, id: RecordId) -> Result<T> {
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(spans::my_operation(id))
//!     .await
//! }
//! ```

use tracing::Span;

use crate::ingest::IngestMode;
use crate::source::LedgerApi;
use crate::types::ids::{RecordId, RecordRange};

/// Span for fetching and storing a single block.
///
/// Parent: backfill_walk span, or none for direct calls
#[inline]
pub(crate) fn ingest_record(id: RecordId, mode: IngestMode) -> Span {
    tracing::trace_span!("blockvault.ingest_record", record_id = %id, mode = %mode)
}

/// Span for one forward walk until the ledger reports no further block.
///
/// Parent: head_advance span in live mode, none for a one-shot backfill
/// Children: ingest_record spans (one per block)
#[inline]
pub(crate) fn backfill_walk(start: RecordId, mode: IngestMode) -> Span {
    tracing::info_span!(
        "blockvault.backfill_walk",
        start = %start,
        mode = %mode,
        next_id = tracing::field::Empty,
    )
}

/// Span for handling one head-advance notification.
///
/// Children: refresh_head, backfill_walk
#[inline]
pub(crate) fn head_advance(head_block_number: u64) -> Span {
    tracing::debug_span!("blockvault.head_advance", head = head_block_number)
}

#[inline]
pub(crate) fn refresh_head() -> Span {
    tracing::debug_span!("blockvault.refresh_head")
}

/// Span for a cache-backed range read.
///
/// Records how many ids had to be fetched upstream.
#[inline]
pub(crate) fn read_range(range: RecordRange) -> Span {
    tracing::debug_span!(
        "blockvault.read_range",
        range = %range,
        gaps = tracing::field::Empty,
    )
}

#[inline]
pub(crate) fn read_one(id: RecordId) -> Span {
    tracing::debug_span!("blockvault.read_one", record_id = %id)
}

/// Span for an uncached pass-through call (accounts, witnesses, history).
#[inline]
pub(crate) fn ledger_query(api: LedgerApi, method: &'static str) -> Span {
    tracing::debug_span!("blockvault.ledger_query", api = %api, method)
}
