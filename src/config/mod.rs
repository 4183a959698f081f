// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Process configuration
//!
//! [`BlockvaultConfig`] gathers everything the runner needs: the ledger
//! endpoint and its transport settings, where the store lives, and which
//! backfill mode to run.
//!
//! # Example: From the environment
//!
//! ```rust,ignore
//! use blockvault::BlockvaultConfig;
//!
//! // Reads LEDGER_RPC_URL, STORE_PATH, ... (and a `.env` file if present)
//! let config = BlockvaultConfig::from_env()?;
//! ```
//!
//! # Example: Builder
//!
//! ```rust
//! use blockvault::{BackfillMode, BlockvaultConfig};
//!
//! let config = BlockvaultConfig::builder("https://node.example.com/rpc")
//!     .store_path("/tmp/blocks.jsonl")
//!     .max_range_limit(50)
//!     .mode(BackfillMode::Once)
//!     .build();
//!
//! assert_eq!(config.max_range_limit, 50);
//! ```
//!
//! # Environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `LEDGER_RPC_URL` | required |
//! | `STORE_PATH` | `./data/blocks.jsonl` |
//! | `RATE_LIMIT_PER_SECOND` | unlimited |
//! | `RPC_TIMEOUT_MS` | 30000 |
//! | `MAX_RETRIES` | 3 |
//! | `HEAD_POLL_INTERVAL_MS` | 3000 |
//! | `STATUS_INTERVAL` | 100 |
//! | `MAX_RANGE_LIMIT` | 100 |
//! | `BACKFILL_MODE` | `live` |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::source::SourceConfig;

pub mod constants;

use constants::{
    DEFAULT_BROADCAST_CAPACITY, DEFAULT_MAX_RANGE_LIMIT, DEFAULT_STATUS_INTERVAL,
    DEFAULT_STORE_PATH,
};

const LEDGER_RPC_URL: &str = "LEDGER_RPC_URL";
const STORE_PATH: &str = "STORE_PATH";
const RATE_LIMIT_PER_SECOND: &str = "RATE_LIMIT_PER_SECOND";
const RPC_TIMEOUT_MS: &str = "RPC_TIMEOUT_MS";
const MAX_RETRIES: &str = "MAX_RETRIES";
const HEAD_POLL_INTERVAL_MS: &str = "HEAD_POLL_INTERVAL_MS";
const STATUS_INTERVAL: &str = "STATUS_INTERVAL";
const MAX_RANGE_LIMIT: &str = "MAX_RANGE_LIMIT";
const BACKFILL_MODE: &str = "BACKFILL_MODE";

/// What the runner does after startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackfillMode {
    /// Follow the chain head only; earlier gaps are filled lazily by reads
    #[default]
    Live,
    /// Walk from the store frontier until caught up, then exit
    Once,
    /// Walk from the store frontier, then keep following the head
    Continuous,
}

impl FromStr for BackfillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "start" => Ok(Self::Live),
            "once" => Ok(Self::Once),
            "continuous" | "populate" => Ok(Self::Continuous),
            other => Err(format!(
                "unknown mode '{other}', expected live, once or continuous"
            )),
        }
    }
}

impl fmt::Display for BackfillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Live => "live",
            Self::Once => "once",
            Self::Continuous => "continuous",
        })
    }
}

/// Complete runner configuration
#[derive(Debug, Clone)]
pub struct BlockvaultConfig {
    /// Ledger endpoint and transport settings
    pub source: SourceConfig,
    /// Record log location; companion head and lock files sit next to it
    pub store_path: PathBuf,
    /// Newly inserted records between ingestion status lines
    pub status_interval: u64,
    /// Largest accepted range-read `limit`
    pub max_range_limit: u64,
    /// Capacity of the live record broadcast channel
    pub broadcast_capacity: usize,
    pub mode: BackfillMode,
}

impl BlockvaultConfig {
    /// Starts a builder with defaults for everything but the endpoint
    pub fn builder(url: impl Into<String>) -> BlockvaultConfigBuilder {
        BlockvaultConfigBuilder::new(url)
    }

    /// Reads configuration from the process environment, loading `.env` first
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] without `LEDGER_RPC_URL`,
    /// [`ConfigError::Invalid`] for any value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Reads configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url = get(LEDGER_RPC_URL).ok_or(ConfigError::Missing {
            key: LEDGER_RPC_URL,
        })?;
        url::Url::parse(&url).map_err(|e| ConfigError::invalid(LEDGER_RPC_URL, &url, e))?;

        let mut source = SourceConfig::new(url)
            .with_rate_limit_opt(parse_var(&get, RATE_LIMIT_PER_SECOND)?);
        if let Some(ms) = parse_var::<u64>(&get, RPC_TIMEOUT_MS)? {
            source = source.with_timeout(Duration::from_millis(ms));
        }
        if let Some(retries) = parse_var(&get, MAX_RETRIES)? {
            source = source.with_max_retries(retries);
        }
        if let Some(ms) = parse_var::<u64>(&get, HEAD_POLL_INTERVAL_MS)? {
            if ms == 0 {
                return Err(ConfigError::invalid(HEAD_POLL_INTERVAL_MS, "0", "must be positive"));
            }
            source = source.with_poll_interval(Duration::from_millis(ms));
        }

        let mut builder = BlockvaultConfigBuilder::new("").source(source);
        if let Some(path) = get(STORE_PATH) {
            builder = builder.store_path(path);
        }
        if let Some(interval) = parse_positive(&get, STATUS_INTERVAL)? {
            builder = builder.status_interval(interval);
        }
        if let Some(limit) = parse_positive(&get, MAX_RANGE_LIMIT)? {
            builder = builder.max_range_limit(limit);
        }
        if let Some(mode) = parse_var(&get, BACKFILL_MODE)? {
            builder = builder.mode(mode);
        }

        Ok(builder.build())
    }
}

fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ConfigError::invalid(key, raw.as_str(), e))
        })
        .transpose()
}

fn parse_positive(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match parse_var::<u64>(get, key)? {
        Some(0) => Err(ConfigError::invalid(key, "0", "must be positive")),
        other => Ok(other),
    }
}

/// Builder for [`BlockvaultConfig`]
#[derive(Debug, Clone)]
pub struct BlockvaultConfigBuilder {
    config: BlockvaultConfig,
}

impl BlockvaultConfigBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            config: BlockvaultConfig {
                source: SourceConfig::new(url),
                store_path: PathBuf::from(DEFAULT_STORE_PATH),
                status_interval: DEFAULT_STATUS_INTERVAL,
                max_range_limit: DEFAULT_MAX_RANGE_LIMIT,
                broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
                mode: BackfillMode::default(),
            },
        }
    }

    /// Replaces the whole source configuration, endpoint included
    pub fn source(mut self, source: SourceConfig) -> Self {
        self.config.source = source;
        self
    }

    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Values below 1 are raised to 1
    pub fn status_interval(mut self, interval: u64) -> Self {
        self.config.status_interval = interval.max(1);
        self
    }

    /// Values below 1 are raised to 1
    pub fn max_range_limit(mut self, limit: u64) -> Self {
        self.config.max_range_limit = limit.max(1);
        self
    }

    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast_capacity = capacity.max(1);
        self
    }

    pub fn mode(mut self, mode: BackfillMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn build(self) -> BlockvaultConfig {
        self.config
    }
}
