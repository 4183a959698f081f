// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the blockvault library.
//!
//! Errors are split by concern so callers can match on exactly the failure
//! they care about:
//!
//! - [`SourceError`] - the remote ledger could not be reached or answered garbage
//! - [`StoreError`] - the local record store failed to read or persist
//! - [`ValidationError`] - a caller-supplied identifier or limit was malformed
//! - [`ReadError`] - a cache-backed read failed; carries an [`ErrorStatus`]
//! - [`IngestError`] - one ingestion step failed (swallowed by the backfill walker)
//! - [`ConfigError`] - the process environment is incomplete or invalid
//!
//! [`BlockvaultError`] wraps all of them for callers that only want `?`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockvault::{ErrorStatus, ExplorerService};
//!
//! match service.get_single_record("42").await {
//!     Ok(block) => println!("{block:?}"),
//!     Err(e) if e.status() == ErrorStatus::NotFound => println!("no such block"),
//!     Err(e) => eprintln!("server fault: {e}"),
//! }
//! ```

mod config;
mod ingest;
mod read;
mod source;
mod store;
mod validation;

pub use config::ConfigError;
pub use ingest::IngestError;
pub use read::{ErrorStatus, ReadError};
pub use source::SourceError;
pub use store::StoreError;
pub use validation::ValidationError;

/// Unified error type for all blockvault operations.
///
/// Every concern-specific error converts into `BlockvaultError` via `From`,
/// so `?` works across module boundaries.
#[derive(Debug, thiserror::Error)]
pub enum BlockvaultError {
    /// Error from a cache-backed read.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Error from a single ingestion step.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Error talking to the remote ledger.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Error from the record store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed caller input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid process configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
