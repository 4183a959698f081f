//! Configuration errors.

/// The process configuration is incomplete or invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{key} must be set")]
    Missing {
        /// Name of the missing variable
        key: &'static str,
    },

    /// A variable is set but cannot be parsed.
    #[error("{key}={value:?} is invalid: {details}")]
    Invalid {
        /// Name of the variable
        key: &'static str,
        /// The raw value
        value: String,
        /// Why it was rejected
        details: String,
    },
}

impl ConfigError {
    /// Create an `Invalid` error.
    pub fn invalid(key: &'static str, value: impl Into<String>, details: impl ToString) -> Self {
        ConfigError::Invalid {
            key,
            value: value.into(),
            details: details.to_string(),
        }
    }
}
