//! Validation errors for caller-supplied identifiers.

/// A caller-supplied value was rejected before any I/O took place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Block ids must be non-negative base-10 integers.
    #[error("ID of block is invalid, should be an integer: {input:?}")]
    InvalidRecordId {
        /// The rejected input
        input: String,
    },

    /// Object ids must have the form `space.type.instance`.
    #[error("Object id is invalid, expected three dot-separated integers: {input:?}")]
    InvalidObjectId {
        /// The rejected input
        input: String,
    },

    /// Account references are an object id or a valid account name.
    #[error("Account is invalid, expected an object id or an account name: {input:?}")]
    InvalidAccount {
        /// The rejected input
        input: String,
    },

    /// Range limits must be positive integers.
    #[error("Range limit is invalid, should be a positive integer: {input:?}")]
    InvalidLimit {
        /// The rejected input
        input: String,
    },

    /// Range limit exceeds the configured maximum.
    #[error("Range limit {limit} exceeds the maximum of {max}")]
    LimitTooLarge {
        /// The requested limit
        limit: u64,
        /// The configured maximum
        max: u64,
    },

    /// `start + limit` does not fit in the id space.
    #[error("Range starting at {start} with limit {limit} overflows the id space")]
    RangeOverflow {
        /// Range start
        start: u64,
        /// Range limit
        limit: u64,
    },
}
