// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Record store backends
//!
//! This module provides the persistent side of the cache:
//!
//! - [`DiskStore`]: append-only JSON-lines record log with an exclusive file lock (default)
//! - [`MemoryStore`]: in-memory store for tests and ephemeral runs
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockvault::{DiskStore, MemoryStore, RecordStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn RecordStore> = Arc::new(DiskStore::open("data/blocks.jsonl").await?);
//! let scratch: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::StoreError;
use crate::types::head::HeadSnapshot;
use crate::types::ids::RecordId;
use crate::types::record::Record;

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Result of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was not cached before and now is
    Inserted,
    /// A record with this id was already cached; nothing was written
    AlreadyPresent,
}

/// Statistics about store usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups for ids the store did not hold
    pub misses: u64,
    /// Records newly written
    pub inserts: u64,
    /// Inserts skipped because the id was already present
    pub duplicates: u64,
    /// Number of records currently held
    pub records: usize,
}

impl StoreStats {
    /// Hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, inserts={}, duplicates={}, records={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.inserts,
            self.duplicates,
            self.records,
            self.hit_rate()
        )
    }
}

/// Trait for record store backends
///
/// A store holds one logical collection of records keyed by block number,
/// plus a singleton slot for the latest [`HeadSnapshot`].
///
/// # Thread Safety
///
/// Implementations must support concurrent access from the ingestion path and
/// any number of readers. Writes are keyed and idempotent, so no caller-side
/// locking is needed.
///
/// # Idempotence
///
/// Inserting an id that is already present must never fail; it reports
/// [`InsertOutcome::AlreadyPresent`] and leaves the stored payload untouched.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores `record` unless its id is already present
    async fn insert_if_absent(&self, record: &Record) -> Result<InsertOutcome, StoreError>;

    /// Looks up a single record
    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Returns every cached record with `min <= id <= max`, ascending by id
    async fn find_by_id_range(
        &self,
        min: RecordId,
        max: RecordId,
    ) -> Result<Vec<Record>, StoreError>;

    /// Highest cached id, or `None` when the store is empty
    async fn last_id(&self) -> Result<Option<RecordId>, StoreError>;

    /// Creates or replaces the singleton head snapshot
    async fn upsert_head(&self, head: &HeadSnapshot) -> Result<(), StoreError>;

    /// The stored head snapshot, if any
    async fn head(&self) -> Result<Option<HeadSnapshot>, StoreError>;

    /// Returns current store statistics
    async fn stats(&self) -> StoreStats;

    /// Returns a human-readable name for this backend
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &'static str;
}
