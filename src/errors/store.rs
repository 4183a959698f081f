//! Errors raised by record store backends.

/// Errors that can occur when reading from or writing to a
/// [`RecordStore`](crate::RecordStore).
///
/// Duplicate inserts are never reported here; they surface as
/// [`InsertOutcome::AlreadyPresent`](crate::InsertOutcome::AlreadyPresent).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[error("Store I/O error at {path}: {details}")]
    Io {
        /// Path of the file involved
        path: String,
        /// Details about the failure
        details: String,
        /// The underlying I/O error, if available
        #[source]
        source: Option<std::io::Error>,
    },

    /// A record or head snapshot could not be (de)serialized.
    #[error("Serialization error: {details}")]
    Serialization {
        /// Details about the failure
        details: String,
        /// The underlying serialization error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Another process holds the store lock.
    #[error("Store at {path} is locked by another process")]
    Locked {
        /// Path of the lock file
        path: String,
    },

    /// The persisted data is unreadable.
    #[error("Store at {path} is corrupt at byte {offset}: {details}")]
    Corrupt {
        /// Path of the corrupt file
        path: String,
        /// Byte offset of the offending entry
        offset: u64,
        /// What was wrong
        details: String,
    },

    /// The backend rejected the operation for a reason of its own.
    #[error("Store backend error: {details}")]
    Backend {
        /// Details reported by the backend
        details: String,
    },
}

impl StoreError {
    /// Create an `Io` error from an I/O error and path.
    pub fn io(path: impl Into<String>, details: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            details: details.into(),
            source: Some(source),
        }
    }

    /// Create a `Serialization` error from any serialization error.
    pub fn serialization(
        details: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Serialization {
            details: details.into(),
            source: Box::new(source),
        }
    }

    /// Create a `Corrupt` error.
    pub fn corrupt(path: impl Into<String>, offset: u64, details: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            offset,
            details: details.into(),
        }
    }

    /// Create a `Backend` error.
    pub fn backend(details: impl Into<String>) -> Self {
        StoreError::Backend {
            details: details.into(),
        }
    }
}
