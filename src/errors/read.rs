//! Errors for cache-backed reads and their status classification.

use std::fmt;

use super::{SourceError, StoreError, ValidationError};

/// Coarse classification of a [`ReadError`] for the boundary layer.
///
/// A transport in front of blockvault maps these to its own signals
/// (e.g. HTTP 400 / 404 / 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The caller sent a malformed identifier or limit.
    BadRequest,
    /// The requested item does not exist.
    NotFound,
    /// Something failed on our side or upstream.
    Internal,
}

impl ErrorStatus {
    /// The conventional HTTP status code for this classification.
    pub fn http_code(self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::NotFound => 404,
            ErrorStatus::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorStatus::BadRequest => "bad request",
            ErrorStatus::NotFound => "not found",
            ErrorStatus::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors returned by the read path ([`RangeReader`](crate::RangeReader) and the
/// read operations of [`ExplorerService`](crate::ExplorerService)).
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Input was rejected before touching the store or the ledger.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An item that was expected to exist could not be obtained.
    #[error("{kind} {id} does not exist")]
    NotFound {
        /// What kind of item was requested (`block`, `object`, ...)
        kind: &'static str,
        /// Identifier of the missing item
        id: String,
    },

    /// The ledger could not be reached.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The store failed while serving cached data.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReadError {
    /// The ledger has no `kind` with this id.
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        ReadError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// A block inside a requested range or lookup could not be obtained.
    pub fn record_not_found(id: impl fmt::Display) -> Self {
        Self::not_found("Block", id)
    }

    /// A ledger object could not be obtained.
    pub fn object_not_found(id: impl fmt::Display) -> Self {
        Self::not_found("Object", id)
    }

    /// Classify this error for the boundary layer.
    pub fn status(&self) -> ErrorStatus {
        match self {
            ReadError::Validation(_) => ErrorStatus::BadRequest,
            ReadError::NotFound { .. } => ErrorStatus::NotFound,
            ReadError::Source(_) | ReadError::Store(_) => ErrorStatus::Internal,
        }
    }
}
