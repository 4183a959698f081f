// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory record store

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{InsertOutcome, RecordStore, StoreStats};
use crate::errors::StoreError;
use crate::types::head::HeadSnapshot;
use crate::types::ids::RecordId;
use crate::types::record::{Payload, Record};

/// Internal state for memory store
#[derive(Debug, Default)]
struct MemoryStoreState {
    /// Cached payloads, ordered by block number
    records: BTreeMap<RecordId, Payload>,
    /// Singleton head slot
    head: Option<HeadSnapshot>,
    /// Usage statistics
    stats: StoreStats,
}

/// In-memory record store
///
/// Holds every record in a `BTreeMap`, so range scans come out ordered for
/// free. Nothing survives the process; use [`DiskStore`](super::DiskStore) for
/// a persistent cache.
///
/// # Examples
///
/// ```rust,ignore
/// use blockvault::MemoryStore;
///
/// let store = MemoryStore::new();
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryStoreState>,
}

impl MemoryStore {
    /// Creates an empty memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_if_absent(&self, record: &Record) -> Result<InsertOutcome, StoreError> {
        let mut state = self.state.lock().await;

        if state.records.contains_key(&record.id()) {
            state.stats.duplicates += 1;
            debug!(record_id = %record.id(), "Record already cached (memory)");
            return Ok(InsertOutcome::AlreadyPresent);
        }

        state.records.insert(record.id(), record.payload().clone());
        state.stats.inserts += 1;
        state.stats.records = state.records.len();
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let mut state = self.state.lock().await;

        let found = state
            .records
            .get(&id)
            .map(|payload| Record::new(id, payload.clone()));

        if found.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        Ok(found)
    }

    async fn find_by_id_range(
        &self,
        min: RecordId,
        max: RecordId,
    ) -> Result<Vec<Record>, StoreError> {
        if min > max {
            return Ok(Vec::new());
        }

        let mut state = self.state.lock().await;

        let found: Vec<Record> = state
            .records
            .range(min..=max)
            .map(|(id, payload)| Record::new(*id, payload.clone()))
            .collect();

        let requested = (max.get() - min.get()).saturating_add(1);
        state.stats.hits += found.len() as u64;
        state.stats.misses += requested.saturating_sub(found.len() as u64);
        Ok(found)
    }

    async fn last_id(&self) -> Result<Option<RecordId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.records.keys().next_back().copied())
    }

    async fn upsert_head(&self, head: &HeadSnapshot) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.head = Some(head.clone());
        Ok(())
    }

    async fn head(&self) -> Result<Option<HeadSnapshot>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.head.clone())
    }

    async fn stats(&self) -> StoreStats {
        let state = self.state.lock().await;
        state.stats.clone()
    }

    fn name(&self) -> &'static str {
        "MemoryStore"
    }
}
