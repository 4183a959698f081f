//! Errors from a single ingestion step.

use super::{SourceError, StoreError};

/// Why one [`BlockIngestor::ingest`](crate::BlockIngestor::ingest) call failed.
///
/// The backfill walker logs these and halts; the next head notification or
/// manual trigger resumes from the store frontier.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Fetching the record from the ledger failed.
    #[error("fetch failed: {0}")]
    Source(#[from] SourceError),

    /// Persisting the record failed.
    #[error("insert failed: {0}")]
    Store(#[from] StoreError),
}
