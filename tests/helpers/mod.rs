// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for blockvault integration tests
//!
//! Provides mock implementations of the ledger and store traits so the
//! ingestion and read paths can be exercised without a node.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use blockvault::{
    HeadSnapshot, HeadStream, InsertOutcome, LedgerApi, LedgerSource, MemoryStore, ObjectId, Payload,
    Record, RecordId, RecordStore, SourceError, StoreError, StoreStats,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Deterministic block payload for `id`
pub fn block_payload(id: u64) -> Payload {
    let value = json!({
        "previous": format!("{:08x}", id.saturating_sub(1)),
        "timestamp": format!("2024-05-01T{:02}:{:02}:{:02}", (id / 1200) % 24, (id / 20) % 60, (id * 3) % 60),
        "witness": format!("1.6.{}", id % 11 + 1),
        "transaction_merkle_root": "0000000000000000000000000000000000000000",
        "extensions": [],
        "witness_signature": format!("1f{id:062x}"),
        "transactions": [{ "ref_block_num": id % 65536, "operations": [] }],
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!("json! object literal"),
    }
}

pub fn block(id: u64) -> Record {
    Record::new(RecordId::new(id), block_payload(id))
}

pub fn ids(records: &[Record]) -> Vec<u64> {
    records.iter().map(|r| r.id().get()).collect()
}

#[derive(Debug, Default)]
struct MockChain {
    blocks: BTreeMap<u64, Payload>,
    head: u64,
    failing: BTreeSet<u64>,
    head_fails: bool,
    objects: HashMap<String, Value>,
    /// Pass-through answers keyed by `api.method`
    responses: HashMap<String, Value>,
    latency: Option<Duration>,
}

/// In-memory ledger
///
/// Blocks `1..=head` exist unless removed. Every call is counted, and
/// `subscribe` hands out a stream fed by [`MockLedgerSource::notify`].
/// Pass-through queries answer `null` unless a response was registered.
///
/// # Example
///
/// ```rust,ignore
/// let source = Arc::new(MockLedgerSource::with_chain(5));
/// source.produce(3);   // blocks 6..=8 now exist
/// source.notify();     // subscribers see head 8
/// ```
#[derive(Debug, Default)]
pub struct MockLedgerSource {
    chain: Mutex<MockChain>,
    fetched: Mutex<Vec<u64>>,
    head_fetches: AtomicUsize,
    object_fetches: AtomicUsize,
    queries: Mutex<Vec<(String, Value)>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<HeadSnapshot>>>,
}

impl MockLedgerSource {
    /// A ledger with blocks `1..=head`
    pub fn with_chain(head: u64) -> Self {
        let source = Self::default();
        source.produce(head);
        source
    }

    pub fn with_object(self, id: &str, value: Value) -> Self {
        self.chain
            .lock()
            .unwrap()
            .objects
            .insert(id.to_string(), value);
        self
    }

    /// Answers `method` on `api` with `response`
    pub fn with_response(self, api: LedgerApi, method: &str, response: Value) -> Self {
        self.chain
            .lock()
            .unwrap()
            .responses
            .insert(format!("{api}.{method}"), response);
        self
    }

    /// Delays every `fetch_record` by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.chain.lock().unwrap().latency = Some(latency);
        self
    }

    /// Appends `count` blocks and moves the head; returns the new head
    pub fn produce(&self, count: u64) -> u64 {
        let mut chain = self.chain.lock().unwrap();
        for _ in 0..count {
            chain.head += 1;
            let id = chain.head;
            chain.blocks.insert(id, block_payload(id));
        }
        chain.head
    }

    /// Sends the current head to every subscriber
    pub fn notify(&self) {
        let head = HeadSnapshot::from_head_number(self.head());
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(head.clone()).is_ok());
    }

    /// Closes every subscription stream
    pub fn close_subscriptions(&self) {
        self.subscribers.lock().unwrap().clear();
    }

    pub fn head(&self) -> u64 {
        self.chain.lock().unwrap().head
    }

    /// Makes fetches of `id` fail with `Unavailable`
    pub fn fail_on(&self, id: u64) {
        self.chain.lock().unwrap().failing.insert(id);
    }

    pub fn heal(&self, id: u64) {
        self.chain.lock().unwrap().failing.remove(&id);
    }

    /// Removes a block below the head, leaving a hole
    pub fn remove_block(&self, id: u64) {
        self.chain.lock().unwrap().blocks.remove(&id);
    }

    pub fn fail_head(&self, fails: bool) {
        self.chain.lock().unwrap().head_fails = fails;
    }

    /// Ids passed to `fetch_record`, in call order
    pub fn fetched_ids(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn record_fetches(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }

    pub fn head_fetches(&self) -> usize {
        self.head_fetches.load(Ordering::SeqCst)
    }

    pub fn object_fetches(&self) -> usize {
        self.object_fetches.load(Ordering::SeqCst)
    }

    /// Pass-through queries as `("api.method", params)`, in call order
    pub fn queries(&self) -> Vec<(String, Value)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    /// Calls of any kind
    pub fn total_calls(&self) -> usize {
        self.record_fetches() + self.head_fetches() + self.object_fetches() + self.query_count()
    }

    pub fn reset_counters(&self) {
        self.fetched.lock().unwrap().clear();
        self.queries.lock().unwrap().clear();
        self.head_fetches.store(0, Ordering::SeqCst);
        self.object_fetches.store(0, Ordering::SeqCst);
    }
}

fn unavailable(operation: String) -> SourceError {
    SourceError::unavailable(
        operation,
        std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
    )
}

#[async_trait]
impl LedgerSource for MockLedgerSource {
    async fn fetch_record(&self, id: RecordId) -> Result<Option<Record>, SourceError> {
        self.fetched.lock().unwrap().push(id.get());
        let latency = self.chain.lock().unwrap().latency;
        match latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        let chain = self.chain.lock().unwrap();
        if chain.failing.contains(&id.get()) {
            return Err(unavailable(format!("get_block {id}")));
        }
        Ok(chain
            .blocks
            .get(&id.get())
            .map(|payload| Record::new(id, payload.clone())))
    }

    async fn fetch_head(&self) -> Result<HeadSnapshot, SourceError> {
        self.head_fetches.fetch_add(1, Ordering::SeqCst);

        let chain = self.chain.lock().unwrap();
        if chain.head_fails {
            return Err(unavailable("get_objects 2.1.0".to_string()));
        }
        Ok(HeadSnapshot::from_head_number(chain.head))
    }

    async fn fetch_object(&self, id: &ObjectId) -> Result<Option<Value>, SourceError> {
        self.object_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.lock().unwrap().objects.get(&id.to_string()).cloned())
    }

    async fn query(
        &self,
        api: LedgerApi,
        method: &'static str,
        params: Value,
    ) -> Result<Value, SourceError> {
        let key = format!("{api}.{method}");
        self.queries.lock().unwrap().push((key.clone(), params));
        Ok(self
            .chain
            .lock()
            .unwrap()
            .responses
            .get(&key)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn subscribe(&self) -> Result<HeadStream, SourceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);

        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|head| (head, rx))
        })
        .boxed())
    }
}

/// Store whose writes can be made to fail
///
/// Reads are served by an inner [`MemoryStore`].
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_inserts: bool,
    fail_head: bool,
}

impl FailingStore {
    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    pub fn failing_head() -> Self {
        Self {
            fail_head: true,
            ..Self::default()
        }
    }

    /// Seeds the inner store, bypassing the failure switch
    pub async fn seed(&self, record: &Record) {
        self.inner.insert_if_absent(record).await.unwrap();
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn insert_if_absent(&self, record: &Record) -> Result<InsertOutcome, StoreError> {
        if self.fail_inserts {
            return Err(StoreError::backend(format!("refusing to store {}", record.id())));
        }
        self.inner.insert_if_absent(record).await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_id_range(
        &self,
        min: RecordId,
        max: RecordId,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner.find_by_id_range(min, max).await
    }

    async fn last_id(&self) -> Result<Option<RecordId>, StoreError> {
        self.inner.last_id().await
    }

    async fn upsert_head(&self, head: &HeadSnapshot) -> Result<(), StoreError> {
        if self.fail_head {
            return Err(StoreError::backend("head collection unavailable"));
        }
        self.inner.upsert_head(head).await
    }

    async fn head(&self) -> Result<Option<HeadSnapshot>, StoreError> {
        self.inner.head().await
    }

    async fn stats(&self) -> StoreStats {
        self.inner.stats().await
    }

    fn name(&self) -> &'static str {
        "FailingStore"
    }
}
