// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for ingestion and range reads
//!
//! These tests use proptest to check the walk and read laws across many
//! chain lengths, cache layouts and query windows.

mod helpers;

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use blockvault::{
    BackfillWalker, BlockIngestor, IngestMode, IngestOutcome, LedgerSource, MemoryStore,
    RangeReader, RecordId, RecordRange, RecordStore,
};
use helpers::{block, ids, MockLedgerSource};
use proptest::prelude::*;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// Helper to generate a chain length and a subset of it to pre-cache
fn arb_chain_and_cache() -> impl Strategy<Value = (u64, BTreeSet<u64>)> {
    (1u64..=60).prop_flat_map(|head| {
        (
            Just(head),
            proptest::collection::btree_set(1..=head, 0..=head as usize),
        )
    })
}

proptest! {
    /// Property: a walk from 1 over a chain of n blocks stores exactly 1..=n
    #[test]
    fn prop_walk_stores_contiguous_prefix(head in 1u64..=80) {
        block_on(async {
            let source = Arc::new(MockLedgerSource::with_chain(head));
            let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
            let ingestor = Arc::new(BlockIngestor::new(source.clone(), store.clone()));

            let summary = BackfillWalker::new(ingestor.clone())
                .walk(RecordId::FIRST, IngestMode::Backlog)
                .await;

            prop_assert_eq!(summary.inserted, head);
            prop_assert_eq!(summary.next_id, RecordId::new(head + 1));

            let stored = store
                .find_by_id_range(RecordId::FIRST, RecordId::new(head + 10))
                .await
                .unwrap();
            prop_assert_eq!(ids(&stored), (1..=head).collect::<Vec<_>>());

            let next = ingestor.ingest(RecordId::new(head + 1), IngestMode::Live).await;
            prop_assert!(matches!(next, IngestOutcome::AlreadyCaughtUp));
            Ok(())
        })?;
    }

    /// Property: ingesting any id sequence stores each existing id once
    #[test]
    fn prop_ingest_is_idempotent(
        head in 1u64..=30,
        attempts in proptest::collection::vec(1u64..=40, 1..60),
    ) {
        block_on(async {
            let source = Arc::new(MockLedgerSource::with_chain(head));
            let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
            let ingestor = BlockIngestor::new(source.clone(), store.clone());

            for &id in &attempts {
                ingestor.ingest(RecordId::new(id), IngestMode::Live).await;
            }

            let expected: BTreeSet<u64> = attempts.iter().copied().filter(|&id| id <= head).collect();
            let stored = store
                .find_by_id_range(RecordId::FIRST, RecordId::new(40))
                .await
                .unwrap();

            prop_assert_eq!(ids(&stored), expected.iter().copied().collect::<Vec<_>>());
            prop_assert_eq!(ingestor.inserted_count(), expected.len() as u64);
            Ok(())
        })?;
    }

    /// Property: a range read is ascending, duplicate-free and equal to
    /// fetching each existing id from the ledger; repeating it is free
    #[test]
    fn prop_read_range_matches_ledger(
        (head, cached) in arb_chain_and_cache(),
        start in 1u64..=60,
        limit in 1u64..=20,
    ) {
        block_on(async {
            let source = Arc::new(MockLedgerSource::with_chain(head));
            let store = Arc::new(MemoryStore::new());
            for &id in &cached {
                store.insert_if_absent(&block(id)).await.unwrap();
            }
            let reader = RangeReader::new(source.clone(), store.clone());
            let range = RecordRange::new(RecordId::new(start), limit).unwrap();

            let result = reader.read_range(range).await;

            if start > head {
                prop_assert!(result.is_err());
                return Ok(());
            }

            let records = result.unwrap();
            let expected: Vec<u64> = range
                .iter()
                .map(RecordId::get)
                .filter(|&id| id <= head)
                .collect();
            prop_assert_eq!(ids(&records), expected.clone());

            for record in &records {
                let upstream = source.fetch_record(record.id()).await.unwrap();
                prop_assert_eq!(Some(record), upstream.as_ref());
            }

            let fetched: BTreeSet<u64> = source.fetched_ids().into_iter().collect();
            let gaps: BTreeSet<u64> = expected
                .iter()
                .copied()
                .filter(|id| !cached.contains(id))
                .collect();
            // Gap fetches plus the per-id comparison fetches above
            prop_assert!(gaps.is_subset(&fetched));

            source.reset_counters();
            let again = reader.read_range(range).await.unwrap();
            prop_assert_eq!(again, records);
            // Ids above the head stay uncached, so a clipped range still
            // bounds its gaps by the head; no block is fetched twice.
            prop_assert_eq!(source.record_fetches(), 0);
            if range.last().get() <= head {
                prop_assert_eq!(source.total_calls(), 0);
            }
            Ok(())
        })?;
    }
}
