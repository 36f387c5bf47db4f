//! Durable max-priority queue of [`Record`]s.
//!
//! Ordering key is `(priority desc, enqueue timestamp asc)`. Every mutating
//! operation mirrors the full queue to disk before returning, using
//! write-temp-then-rename so a crash mid-write never leaves a torn file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::observer::Record;

pub const DEFAULT_FILE: &str = "blackbox_heap.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    priority: i32,
    timestamp: i64,
    record: Record,
}

/// A durable, disk-mirrored max-priority queue.
///
/// Not internally synchronized: callers sharing a BlackBox across tasks hold
/// it behind a single lock (see the concurrency model), matching the
/// "all operations are mutually exclusive" contract.
pub struct BlackBox {
    path: PathBuf,
    queue: Vec<Entry>,
}

impl BlackBox {
    /// Open (or create) a BlackBox mirrored at `path`. A missing or corrupt
    /// file yields an empty queue rather than an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let queue = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<Entry>>(&bytes) {
                Ok(mut entries) => {
                    sort_entries(&mut entries);
                    entries
                }
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "corrupt blackbox file, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                debug!(error = %e, path = %path.display(), "no blackbox file, starting empty");
                Vec::new()
            }
        };
        Self { path, queue }
    }

    /// Insert a record, stamped with the current enqueue time, and mirror
    /// the queue to disk.
    pub fn push(&mut self, record: Record) -> Result<(), StorageError> {
        let timestamp = now_secs();
        let priority = record.priority as i32;
        self.queue.push(Entry { priority, timestamp, record });
        sort_entries(&mut self.queue);
        self.persist()
    }

    /// The `n` highest-priority records (ties broken oldest-first),
    /// without removing them.
    pub fn peek(&self, n: usize) -> Vec<Record> {
        self.queue.iter().take(n).map(|e| e.record.clone()).collect()
    }

    /// Remove the `n` highest-priority records and mirror the queue to
    /// disk.
    pub fn confirm(&mut self, n: usize) -> Result<Vec<Record>, StorageError> {
        let n = n.min(self.queue.len());
        let removed: Vec<Record> = self.queue.drain(0..n).map(|e| e.record).collect();
        self.persist()?;
        Ok(removed)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_vec(&self.queue).map_err(StorageError::Parse)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json).map_err(StorageError::Write)?;
        fs::rename(&tmp, &self.path).map_err(StorageError::Write)?;
        Ok(())
    }
}

/// Priority descending, timestamp ascending.
fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.timestamp.cmp(&b.timestamp)));
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
