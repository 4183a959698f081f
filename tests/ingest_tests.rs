// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tests for block ingestion, backfill walks, head tracking and subscriptions

mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use blockvault::{
    BackfillWalker, BlockIngestor, BroadcastHook, ChainSubscription, HeadSnapshot, HeadTracker,
    IngestError, IngestHook, IngestMode, IngestOutcome, MemoryStore, Record, RecordId,
    RecordStore, StatusLine, WalkStop,
};
use helpers::{block, ids, FailingStore, MockLedgerSource};
use tokio::sync::broadcast;

fn ingestor(source: &Arc<MockLedgerSource>, store: &Arc<dyn RecordStore>) -> BlockIngestor {
    BlockIngestor::new(source.clone(), store.clone())
}

async fn stored_ids(store: &Arc<dyn RecordStore>) -> Vec<u64> {
    let all = store
        .find_by_id_range(RecordId::new(0), RecordId::new(1_000_000))
        .await
        .unwrap();
    ids(&all)
}

/// Receives `count` records or panics after a generous timeout
async fn recv_records(rx: &mut broadcast::Receiver<Record>, count: usize) -> Vec<u64> {
    let mut received = Vec::with_capacity(count);
    for _ in 0..count {
        let record = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for ingested block")
            .unwrap();
        received.push(record.id().get());
    }
    received
}

#[derive(Default)]
struct RecordingHook {
    inserted: Mutex<Vec<(u64, IngestMode)>>,
    statuses: Mutex<Vec<StatusLine>>,
}

impl IngestHook for RecordingHook {
    fn on_record_inserted(&self, record: &Record, mode: IngestMode) {
        self.inserted.lock().unwrap().push((record.id().get(), mode));
    }

    fn on_status(&self, status: &StatusLine) {
        self.statuses.lock().unwrap().push(status.clone());
    }
}

#[tokio::test]
async fn test_ingest_is_idempotent() {
    let source = Arc::new(MockLedgerSource::with_chain(5));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let ingestor = ingestor(&source, &store);

    let first = ingestor.ingest(RecordId::new(3), IngestMode::Live).await;
    assert!(matches!(first, IngestOutcome::Inserted(ref r) if *r == block(3)));

    let second = ingestor.ingest(RecordId::new(3), IngestMode::Live).await;
    assert!(matches!(second, IngestOutcome::AlreadyStored(ref r) if r.id() == RecordId::new(3)));

    assert_eq!(stored_ids(&store).await, vec![3]);
    assert_eq!(ingestor.inserted_count(), 1);
    assert_eq!(store.stats().await.duplicates, 1);
}

#[tokio::test]
async fn test_ingest_past_head_is_caught_up() {
    let source = Arc::new(MockLedgerSource::with_chain(5));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

    let outcome = ingestor(&source, &store)
        .ingest(RecordId::new(6), IngestMode::Backlog)
        .await;

    assert!(matches!(outcome, IngestOutcome::AlreadyCaughtUp));
    assert!(store.last_id().await.unwrap().is_none());
}

#[tokio::test]
async fn test_ingest_reports_source_and_store_failures() {
    let source = Arc::new(MockLedgerSource::with_chain(5));
    source.fail_on(2);
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

    let outcome = ingestor(&source, &store)
        .ingest(RecordId::new(2), IngestMode::Live)
        .await;
    assert!(matches!(outcome, IngestOutcome::Failed(IngestError::Source(_))));

    let failing: Arc<dyn RecordStore> = Arc::new(FailingStore::failing_inserts());
    let outcome = ingestor(&source, &failing)
        .ingest(RecordId::new(1), IngestMode::Live)
        .await;
    assert!(matches!(outcome, IngestOutcome::Failed(IngestError::Store(_))));
}

#[tokio::test]
async fn test_walk_fills_contiguous_range_and_stops_at_head() {
    let source = Arc::new(MockLedgerSource::with_chain(25));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let ingestor = Arc::new(ingestor(&source, &store));
    let walker = BackfillWalker::new(ingestor.clone());

    assert_eq!(walker.start_id().await.unwrap(), RecordId::FIRST);

    let summary = walker.walk(RecordId::FIRST, IngestMode::Backlog).await;

    assert_eq!(summary.inserted, 25);
    assert_eq!(summary.already_stored, 0);
    assert_eq!(summary.next_id, RecordId::new(26));
    assert!(summary.caught_up());
    assert_eq!(stored_ids(&store).await, (1..=25).collect::<Vec<_>>());

    assert_eq!(walker.start_id().await.unwrap(), RecordId::new(26));
    assert!(matches!(
        ingestor.ingest(RecordId::new(26), IngestMode::Live).await,
        IngestOutcome::AlreadyCaughtUp
    ));
}

#[tokio::test]
async fn test_walk_over_stored_blocks_counts_them() {
    let source = Arc::new(MockLedgerSource::with_chain(6));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    for id in [2, 3] {
        store.insert_if_absent(&block(id)).await.unwrap();
    }

    let walker = BackfillWalker::new(Arc::new(ingestor(&source, &store)));
    let summary = walker.walk(RecordId::FIRST, IngestMode::Backlog).await;

    assert_eq!(summary.inserted, 4);
    assert_eq!(summary.already_stored, 2);
    assert_eq!(summary.processed(), 6);
    assert_eq!(stored_ids(&store).await, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_walk_stops_on_failure_and_resumes_from_frontier() {
    let source = Arc::new(MockLedgerSource::with_chain(10));
    source.fail_on(4);
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let walker = BackfillWalker::new(Arc::new(ingestor(&source, &store)));

    let summary = walker.walk_from_frontier(IngestMode::Backlog).await.unwrap();
    assert_eq!(summary.inserted, 3);
    assert!(matches!(summary.stop, WalkStop::Failed { at, .. } if at == RecordId::new(4)));
    assert_eq!(summary.next_id, RecordId::new(4));

    // The walker does not retry on its own
    let attempts_on_4 = source.fetched_ids().iter().filter(|&&id| id == 4).count();
    assert_eq!(attempts_on_4, 1);

    source.heal(4);
    let summary = walker.walk_from_frontier(IngestMode::Backlog).await.unwrap();
    assert_eq!(summary.start, RecordId::new(4));
    assert_eq!(summary.inserted, 7);
    assert!(summary.caught_up());
    assert_eq!(stored_ids(&store).await, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_frontier_walk_skips_holes_below_written_back_block() {
    let source = Arc::new(MockLedgerSource::with_chain(12));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    store.insert_if_absent(&block(1)).await.unwrap();
    // As a range read would write it back
    store.insert_if_absent(&block(8)).await.unwrap();
    let walker = BackfillWalker::new(Arc::new(ingestor(&source, &store)));

    assert_eq!(walker.start_id().await.unwrap(), RecordId::new(9));
    let summary = walker.walk_from_frontier(IngestMode::Backlog).await.unwrap();
    assert_eq!(summary.start, RecordId::new(9));
    assert_eq!(stored_ids(&store).await, vec![1, 8, 9, 10, 11, 12]);

    let summary = walker.walk(RecordId::new(2), IngestMode::Backlog).await;
    assert!(summary.caught_up());
    assert_eq!(summary.inserted, 6);
    assert_eq!(stored_ids(&store).await, (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_status_lines_follow_insert_count() {
    let source = Arc::new(MockLedgerSource::with_chain(10));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let hook = Arc::new(RecordingHook::default());
    let ingestor = Arc::new(
        ingestor(&source, &store)
            .with_status_interval(3)
            .with_hook(hook.clone()),
    );

    BackfillWalker::new(ingestor.clone())
        .walk(RecordId::FIRST, IngestMode::Backlog)
        .await;
    // Re-ingesting stored blocks does not advance the cadence
    ingestor.ingest(RecordId::new(1), IngestMode::Live).await;

    let statuses = hook.statuses.lock().unwrap().clone();
    assert_eq!(
        statuses.iter().map(|s| s.record_id.get()).collect::<Vec<_>>(),
        vec![3, 6, 9]
    );
    assert!(statuses.iter().all(|s| s.backlog));
    assert_eq!(statuses[2].inserted_total, 9);
    assert_eq!(statuses[0].timestamp.as_deref(), block(3).payload()["timestamp"].as_str());

    let inserted = hook.inserted.lock().unwrap();
    assert_eq!(inserted.len(), 10);
    assert!(inserted.iter().all(|(_, mode)| *mode == IngestMode::Backlog));
}

#[tokio::test]
async fn test_live_status_line_is_not_backlog() {
    let source = Arc::new(MockLedgerSource::with_chain(2));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let hook = Arc::new(RecordingHook::default());
    let ingestor = ingestor(&source, &store)
        .with_status_interval(1)
        .with_hook(hook.clone());

    ingestor.ingest(RecordId::new(2), IngestMode::Live).await;

    let statuses = hook.statuses.lock().unwrap();
    assert_eq!(statuses.len(), 1);
    assert!(!statuses[0].backlog);
    assert!(!statuses[0].to_string().contains("backlog"));
}

#[tokio::test]
async fn test_head_tracker_tolerates_persist_failure() {
    let source = Arc::new(MockLedgerSource::with_chain(12));

    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let tracker = HeadTracker::new(source.clone(), store.clone());
    let head = tracker.refresh().await.unwrap();
    assert_eq!(head.head_block_number(), 12);
    assert_eq!(tracker.cached().await.unwrap(), Some(head));

    let failing: Arc<dyn RecordStore> = Arc::new(FailingStore::failing_head());
    let tracker = HeadTracker::new(source.clone(), failing);
    let head = tracker.refresh().await.unwrap();
    assert_eq!(head.head_block_number(), 12);
    assert!(tracker.cached().await.unwrap().is_none());

    source.fail_head(true);
    assert!(tracker.refresh().await.is_err());
}

#[tokio::test]
async fn test_advance_on_empty_store_starts_at_head() {
    let source = Arc::new(MockLedgerSource::with_chain(5));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let subscription =
        ChainSubscription::new(source.clone(), Arc::new(ingestor(&source, &store)));

    let summary = subscription
        .handle_advance(HeadSnapshot::from_head_number(5))
        .await
        .unwrap();

    assert_eq!(summary.start, RecordId::new(5));
    assert_eq!(stored_ids(&store).await, vec![5]);
    assert_eq!(
        store.head().await.unwrap().map(|h| h.head_block_number()),
        Some(5)
    );
}

#[tokio::test]
async fn test_advance_uses_notified_head_when_refresh_fails() {
    let source = Arc::new(MockLedgerSource::with_chain(6));
    source.fail_head(true);
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    for id in 1..=3 {
        store.insert_if_absent(&block(id)).await.unwrap();
    }
    let subscription =
        ChainSubscription::new(source.clone(), Arc::new(ingestor(&source, &store)));

    let summary = subscription
        .handle_advance(HeadSnapshot::from_head_number(6))
        .await
        .unwrap();

    assert_eq!(summary.start, RecordId::new(4));
    assert_eq!(summary.inserted, 3);
    assert_eq!(stored_ids(&store).await, (1..=6).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_live_subscription_follows_notifications() {
    let source = Arc::new(MockLedgerSource::with_chain(5));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let hook = BroadcastHook::new(64);
    let mut rx = hook.subscribe();
    let ingestor = Arc::new(ingestor(&source, &store).with_hook(Arc::new(hook)));

    let handle = ChainSubscription::new(source.clone(), ingestor)
        .start()
        .await
        .unwrap();

    source.notify();
    assert_eq!(recv_records(&mut rx, 1).await, vec![5]);

    source.produce(3);
    source.notify();
    assert_eq!(recv_records(&mut rx, 3).await, vec![6, 7, 8]);

    handle.shutdown().await;
    assert_eq!(stored_ids(&store).await, vec![5, 6, 7, 8]);
}

#[tokio::test]
async fn test_subscription_with_backfill_walks_backlog_first() {
    let source = Arc::new(MockLedgerSource::with_chain(4));
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let hook = BroadcastHook::new(64);
    let mut rx = hook.subscribe();
    let ingestor = Arc::new(ingestor(&source, &store).with_hook(Arc::new(hook)));

    let mut handle = ChainSubscription::new(source.clone(), ingestor)
        .start_with_backfill()
        .await
        .unwrap();

    assert_eq!(recv_records(&mut rx, 4).await, vec![1, 2, 3, 4]);

    source.produce(2);
    source.notify();
    assert_eq!(recv_records(&mut rx, 2).await, vec![5, 6]);

    // Ending the stream ends the task
    source.close_subscriptions();
    tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("subscription task should end with its stream")
        .unwrap();
    assert!(handle.is_finished());
}
