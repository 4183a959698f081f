// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Ledger source configuration options

use std::time::Duration;

use crate::config::constants::{
    DEFAULT_HEAD_POLL_INTERVAL, DEFAULT_MAX_RETRIES, DEFAULT_RPC_TIMEOUT,
};

/// Configuration for an [`RpcLedgerSource`](crate::RpcLedgerSource)
///
/// # Example
///
/// ```rust
/// use blockvault::SourceConfig;
/// use std::time::Duration;
///
/// let config = SourceConfig::new("https://node.example.com/rpc")
///     .with_rate_limit(10)
///     .with_timeout(Duration::from_secs(10));
///
/// assert!(config.has_rate_limiting());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Node HTTP RPC endpoint
    pub url: String,
    /// Requests per second (None for unlimited)
    pub rate_limit_per_second: Option<u32>,
    /// Upper bound on one call, retries included
    pub timeout: Duration,
    /// Transport-level retries for transient failures
    pub max_retries: u32,
    /// How often the head is polled for subscriptions
    pub poll_interval: Duration,
}

impl SourceConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rate_limit_per_second: None,
            timeout: DEFAULT_RPC_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            poll_interval: DEFAULT_HEAD_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit_per_second = Some(requests_per_second);
        self
    }

    #[must_use]
    pub fn with_rate_limit_opt(mut self, requests_per_second: Option<u32>) -> Self {
        self.rate_limit_per_second = requests_per_second;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn has_rate_limiting(&self) -> bool {
        self.rate_limit_per_second.is_some()
    }
}

impl Default for SourceConfig {
    /// A local witness node's default RPC port
    fn default() -> Self {
        Self::new("http://127.0.0.1:8090")
    }
}
