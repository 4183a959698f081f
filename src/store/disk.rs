// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Disk-based record store with an append-only log, file locking and versioning

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{InsertOutcome, RecordStore, StoreStats};
use crate::errors::StoreError;
use crate::types::head::HeadSnapshot;
use crate::types::ids::RecordId;
use crate::types::record::{Payload, Record};

/// Current record log format version
const STORE_VERSION: u32 = 1;

/// First line of every record log
#[derive(Debug, Serialize, Deserialize)]
struct LogHeader {
    version: u32,
    created_at: DateTime<Utc>,
}

/// A log line as written
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum LogLineRef<'a> {
    Header(&'a LogHeader),
    Record { id: RecordId, payload: &'a Payload },
}

/// A log line as read back for a lookup
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum LogLine {
    #[allow(dead_code)]
    Header(LogHeader),
    Record { id: RecordId, payload: Payload },
}

/// A log line as scanned while rebuilding the index; payloads are skipped
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum IndexLine {
    Header(LogHeader),
    Record {
        id: RecordId,
        #[allow(dead_code)]
        payload: IgnoredAny,
    },
}

/// Location of one record line in the log
#[derive(Debug, Clone, Copy)]
struct LineSpan {
    offset: u64,
    len: u64,
}

/// Result of scanning an existing log
struct Replay {
    index: BTreeMap<RecordId, LineSpan>,
    valid_len: u64,
    file_len: u64,
    has_header: bool,
}

/// Internal state for disk store
#[derive(Debug)]
struct DiskStoreState {
    /// Record log, opened for reading and appending
    log: File,
    /// Byte length of the log (next append offset)
    end: u64,
    /// Block number to line location
    index: BTreeMap<RecordId, LineSpan>,
    /// Cached copy of the head file
    head: Option<HeadSnapshot>,
    /// Usage statistics (in-memory only, not persisted)
    stats: StoreStats,
}

/// Disk-based record store
///
/// Records are appended to a JSON-lines log, one block per line, behind a
/// versioned header line. An in-memory index from block number to byte range
/// is rebuilt on open, so payloads stay on disk until they are read. The head
/// snapshot lives in a separate small JSON file that is replaced atomically.
///
/// Given `blocks.jsonl`, the store uses:
///
/// - `blocks.jsonl`: the record log
/// - `blocks.head.json`: the head snapshot
/// - `blocks.lock`: advisory lock held for the lifetime of the store
///
/// # Crash Safety
///
/// A line torn by a crash mid-append can only be the last one; it is detected
/// and truncated on the next open. Any other unreadable line is reported as
/// [`StoreError::Corrupt`] rather than silently dropped.
///
/// # Examples
///
/// ```rust,ignore
/// use blockvault::DiskStore;
///
/// let store = DiskStore::open("/var/lib/blockvault/blocks.jsonl").await?;
/// ```
#[derive(Debug)]
pub struct DiskStore {
    path: PathBuf,
    head_path: PathBuf,
    /// Held only to keep the advisory lock
    _lock: std::fs::File,
    state: Mutex<DiskStoreState>,
}

impl DiskStore {
    /// Opens (or creates) the store at `path`
    ///
    /// Creates the parent directory if needed, takes the exclusive lock and
    /// rebuilds the id index from the existing log.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Locked`] if another process has the store open
    /// - [`StoreError::Corrupt`] if the log was written by an incompatible
    ///   version or contains an unreadable line before its end
    /// - [`StoreError::Io`] for filesystem failures
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let log_path = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::io(
                    parent.display().to_string(),
                    "failed to create store directory",
                    e,
                )
            })?;
        }

        let lock = acquire_lock(&path.with_extension("lock"))?;

        let mut log = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(&log_path, "failed to open record log", e))?;

        let replay = replay(&mut log, &log_path).await?;

        if replay.valid_len < replay.file_len {
            warn!(
                path = %log_path,
                dropped_bytes = replay.file_len - replay.valid_len,
                "Truncating torn entry at end of record log"
            );
            log.set_len(replay.valid_len)
                .await
                .map_err(|e| StoreError::io(&log_path, "failed to truncate torn entry", e))?;
        }

        let mut end = replay.valid_len;
        if !replay.has_header {
            let header = LogHeader {
                version: STORE_VERSION,
                created_at: Utc::now(),
            };
            let line = encode_line(&LogLineRef::Header(&header))?;
            append_line(&mut log, &line)
                .await
                .map_err(|e| StoreError::io(&log_path, "failed to write log header", e))?;
            end += line.len() as u64;
        }

        let head_path = path.with_extension("head.json");
        let head = load_head(&head_path).await;

        info!(
            path = %log_path,
            records = replay.index.len(),
            version = STORE_VERSION,
            "Opened disk store"
        );

        let stats = StoreStats {
            records: replay.index.len(),
            ..StoreStats::default()
        };

        Ok(Self {
            path,
            head_path,
            _lock: lock,
            state: Mutex::new(DiskStoreState {
                log,
                end,
                index: replay.index,
                head,
                stats,
            }),
        })
    }

    /// Path of the record log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the record line at `span`
    async fn read_record(
        &self,
        state: &mut DiskStoreState,
        id: RecordId,
        span: LineSpan,
    ) -> Result<Record, StoreError> {
        let log_path = self.path.display().to_string();

        state
            .log
            .seek(SeekFrom::Start(span.offset))
            .await
            .map_err(|e| StoreError::io(&log_path, format!("failed to seek to block {id}"), e))?;

        let mut line = vec![0u8; span.len as usize];
        state
            .log
            .read_exact(&mut line)
            .await
            .map_err(|e| StoreError::io(&log_path, format!("failed to read block {id}"), e))?;

        match serde_json::from_slice::<LogLine>(&line) {
            Ok(LogLine::Record {
                id: stored,
                payload,
            }) if stored == id => Ok(Record::new(id, payload)),
            Ok(_) => Err(StoreError::corrupt(
                log_path,
                span.offset,
                format!("index entry for block {id} points at a different line"),
            )),
            Err(e) => Err(StoreError::serialization(
                format!("failed to decode block {id}"),
                e,
            )),
        }
    }
}

#[async_trait]
impl RecordStore for DiskStore {
    async fn insert_if_absent(&self, record: &Record) -> Result<InsertOutcome, StoreError> {
        let id = record.id();
        let line = encode_line(&LogLineRef::Record {
            id,
            payload: record.payload(),
        })?;

        let mut state = self.state.lock().await;

        if state.index.contains_key(&id) {
            state.stats.duplicates += 1;
            debug!(record_id = %id, "Record already cached (disk)");
            return Ok(InsertOutcome::AlreadyPresent);
        }

        let offset = state.end;
        if let Err(e) = append_line(&mut state.log, &line).await {
            // Keep the log line-aligned for the next append.
            if let Err(truncate_err) = state.log.set_len(offset).await {
                warn!(error = %truncate_err, "Failed to roll back partial append");
            }
            return Err(StoreError::io(
                self.path.display().to_string(),
                format!("failed to append block {id}"),
                e,
            ));
        }

        let len = line.len() as u64;
        state.end += len;
        state.index.insert(id, LineSpan { offset, len });
        state.stats.inserts += 1;
        state.stats.records = state.index.len();
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let mut state = self.state.lock().await;

        let Some(span) = state.index.get(&id).copied() else {
            state.stats.misses += 1;
            return Ok(None);
        };

        let record = self.read_record(&mut state, id, span).await?;
        state.stats.hits += 1;
        Ok(Some(record))
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

        let spans: Vec<(RecordId, LineSpan)> = state
            .index
            .range(min..=max)
            .map(|(id, span)| (*id, *span))
            .collect();

        let mut records = Vec::with_capacity(spans.len());
        for (id, span) in spans {
            records.push(self.read_record(&mut state, id, span).await?);
        }

        let requested = (max.get() - min.get()).saturating_add(1);
        state.stats.hits += records.len() as u64;
        state.stats.misses += requested.saturating_sub(records.len() as u64);
        Ok(records)
    }

    async fn last_id(&self) -> Result<Option<RecordId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.index.keys().next_back().copied())
    }

    async fn upsert_head(&self, head: &HeadSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(head)
            .map_err(|e| StoreError::serialization("failed to encode head snapshot", e))?;

        // Held across the write so concurrent upserts do not share the temp file.
        let mut state = self.state.lock().await;

        let temp_path = self.head_path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            StoreError::io(
                temp_path.display().to_string(),
                "failed to write head snapshot",
                e,
            )
        })?;
        tokio::fs::rename(&temp_path, &self.head_path)
            .await
            .map_err(|e| {
                StoreError::io(
                    self.head_path.display().to_string(),
                    "failed to replace head snapshot",
                    e,
                )
            })?;

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
        "DiskStore"
    }
}

/// Takes the exclusive advisory lock guarding the store
fn acquire_lock(lock_path: &Path) -> Result<std::fs::File, StoreError> {
    let lock_display = lock_path.display().to_string();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)
        .map_err(|e| StoreError::io(&lock_display, "failed to open lock file", e))?;

    // std advisory locking, requires Rust 1.89+
    match file.try_lock() {
        Ok(()) => Ok(file),
        Err(std::fs::TryLockError::WouldBlock) => Err(StoreError::Locked { path: lock_display }),
        Err(std::fs::TryLockError::Error(e)) => {
            Err(StoreError::io(lock_display, "failed to acquire store lock", e))
        }
    }
}

/// Scans the log, rebuilding the index and finding where valid data ends
async fn replay(log: &mut File, path: &str) -> Result<Replay, StoreError> {
    let file_len = log
        .metadata()
        .await
        .map_err(|e| StoreError::io(path, "failed to stat record log", e))?
        .len();

    log.seek(SeekFrom::Start(0))
        .await
        .map_err(|e| StoreError::io(path, "failed to rewind record log", e))?;

    let mut reader = BufReader::new(log);
    let mut index = BTreeMap::new();
    let mut has_header = false;
    let mut offset = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| StoreError::io(path, "failed to read record log", e))?
            as u64;
        if read == 0 {
            break;
        }

        let complete = line.last() == Some(&b'\n');
        let parsed = complete
            .then(|| serde_json::from_slice::<IndexLine>(&line).ok())
            .flatten();

        match parsed {
            Some(IndexLine::Header(header)) if offset == 0 => {
                if header.version != STORE_VERSION {
                    return Err(StoreError::corrupt(
                        path,
                        0,
                        format!(
                            "unsupported log version {} (expected {STORE_VERSION})",
                            header.version
                        ),
                    ));
                }
                has_header = true;
            }
            Some(IndexLine::Header(_)) => {
                return Err(StoreError::corrupt(path, offset, "unexpected header line"));
            }
            Some(IndexLine::Record { id, .. }) if has_header => {
                index.entry(id).or_insert(LineSpan {
                    offset,
                    len: read,
                });
            }
            Some(IndexLine::Record { .. }) => {
                return Err(StoreError::corrupt(path, offset, "record before header"));
            }
            None if offset + read == file_len => break,
            None => {
                return Err(StoreError::corrupt(path, offset, "unreadable log line"));
            }
        }

        offset += read;
    }

    Ok(Replay {
        index,
        valid_len: offset,
        file_len,
        has_header,
    })
}

/// Reads the head file; a missing or unreadable file means "no head yet"
async fn load_head(path: &Path) -> Option<HeadSnapshot> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read head snapshot, ignoring");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(head) => Some(head),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse head snapshot, ignoring");
            None
        }
    }
}

fn encode_line(line: &LogLineRef<'_>) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec(line)
        .map_err(|e| StoreError::serialization("failed to encode log line", e))?;
    bytes.push(b'\n');
    Ok(bytes)
}

async fn append_line(log: &mut File, line: &[u8]) -> std::io::Result<()> {
    log.write_all(line).await?;
    log.flush().await
}
