//! Errors raised while talking to the remote ledger.

use std::time::Duration;

/// Errors that can occur when fetching from a [`LedgerSource`](crate::LedgerSource).
///
/// Absence of a record is *not* an error: `fetch_record` reports it as
/// `Ok(None)`, which is how the ingestion path detects that it has caught up.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The ledger endpoint could not be reached or the call failed in transit.
    #[error("Ledger source unavailable during {operation}")]
    Unavailable {
        /// Description of the call that failed (e.g. `get_block 42`)
        operation: String,
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The call did not complete within the configured timeout.
    #[error("Ledger call {operation} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Description of the call that timed out
        operation: String,
        /// The timeout that was exceeded
        timeout: Duration,
    },

    /// The ledger answered, but not with the shape we expect.
    #[error("Malformed response to {operation}: {details}")]
    MalformedResponse {
        /// Description of the call
        operation: String,
        /// What was wrong with the response
        details: String,
    },
}

impl SourceError {
    /// Create an `Unavailable` error from any transport error.
    pub fn unavailable(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SourceError::Unavailable {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Create a `Timeout` error.
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        SourceError::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    /// Create a `MalformedResponse` error.
    pub fn malformed(operation: impl Into<String>, details: impl Into<String>) -> Self {
        SourceError::MalformedResponse {
            operation: operation.into(),
            details: details.into(),
        }
    }
}
