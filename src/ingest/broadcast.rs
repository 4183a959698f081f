// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Live feed of newly ingested blocks

use tokio::sync::broadcast;
use tracing::trace;

use super::{IngestHook, IngestMode};
use crate::types::record::Record;

/// Publishes every newly inserted block on a broadcast channel
///
/// Receivers that fall more than `capacity` blocks behind get
/// [`broadcast::error::RecvError::Lagged`] and skip ahead; ingestion itself
/// never waits for them.
#[derive(Debug, Clone)]
pub struct BroadcastHook {
    sender: broadcast::Sender<Record>,
}

impl BroadcastHook {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A receiver for blocks inserted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Record> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl IngestHook for BroadcastHook {
    fn on_record_inserted(&self, record: &Record, _mode: IngestMode) {
        if self.sender.send(record.clone()).is_err() {
            trace!(record_id = %record.id(), "No live subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ids::RecordId;

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let hook = BroadcastHook::new(4);
        let mut rx = hook.subscribe();

        let record = Record::new(RecordId::new(7), Default::default());
        hook.on_record_inserted(&record, IngestMode::Live);

        assert_eq!(rx.recv().await.unwrap(), record);
        assert_eq!(hook.receiver_count(), 1);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let hook = BroadcastHook::new(4);
        hook.on_record_inserted(
            &Record::new(RecordId::new(1), Default::default()),
            IngestMode::Backlog,
        );
        assert_eq!(hook.receiver_count(), 0);
    }
}
