//! In-memory store, used to exercise the gateway without touching a disk.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWrite;

use super::{blocks_for, EntryKind, EntryStat, FileReader, FileStore, FileWriter};
use crate::{GatewayError, Result};

#[derive(Debug, Clone)]
struct MemoryEntry {
    kind: EntryKind,
    changed_at: DateTime<Utc>,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, MemoryEntry>,
    unavailable: bool,
    fail_writes: bool,
}

/// Store that keeps all entries in a shared map.
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still consistent: every mutation is a single insert/remove/extend.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a regular file with the given change time.
    pub fn insert_file(&self, name: &str, data: impl Into<Vec<u8>>, changed_at: DateTime<Utc>) {
        self.insert(name, EntryKind::File, data.into(), changed_at);
    }

    /// Insert a directory entry.
    pub fn insert_dir(&self, name: &str, changed_at: DateTime<Utc>) {
        self.insert(name, EntryKind::Dir, Vec::new(), changed_at);
    }

    /// Insert a non-file, non-directory entry (device, socket, ...).
    pub fn insert_special(&self, name: &str, changed_at: DateTime<Utc>) {
        self.insert(name, EntryKind::Other, Vec::new(), changed_at);
    }

    fn insert(&self, name: &str, kind: EntryKind, data: Vec<u8>, changed_at: DateTime<Utc>) {
        self.lock().entries.insert(
            name.to_string(),
            MemoryEntry {
                kind,
                changed_at,
                data,
            },
        );
    }

    /// Make `entries` fail as if the store directory were unreadable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Make every write into a created entry fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Get a copy of an entry's content.
    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().entries.get(name).map(|e| e.data.clone())
    }

    /// Number of entries of any kind.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn entries(&self) -> Result<Vec<String>> {
        let inner = self.lock();
        if inner.unavailable {
            return Err(GatewayError::StoreUnavailable("memory store offline".to_string()));
        }
        Ok(inner.entries.keys().cloned().collect())
    }

    async fn stat(&self, name: &str) -> Result<EntryStat> {
        let inner = self.lock();
        let entry = inner
            .entries
            .get(name)
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))?;
        let size = entry.data.len() as u64;

        Ok(EntryStat {
            kind: entry.kind,
            changed_at: entry.changed_at,
            size,
            blocks: blocks_for(size),
        })
    }

    async fn open(&self, name: &str) -> Result<FileReader> {
        let inner = self.lock();
        match inner.entries.get(name) {
            Some(entry) if entry.kind == EntryKind::File => {
                Ok(Box::new(io::Cursor::new(entry.data.clone())))
            }
            _ => Err(GatewayError::NotFound(name.to_string())),
        }
    }

    async fn create_new(&self, name: &str) -> Result<FileWriter> {
        let mut inner = self.lock();
        if inner.entries.contains_key(name) {
            return Err(GatewayError::WriteFailure(format!("{name} already exists")));
        }
        inner.entries.insert(
            name.to_string(),
            MemoryEntry {
                kind: EntryKind::File,
                changed_at: Utc::now(),
                data: Vec::new(),
            },
        );

        Ok(Box::new(MemoryWriter {
            store: self.clone(),
            name: name.to_string(),
        }))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.lock().entries.remove(name);
        Ok(())
    }
}

/// Writer that appends straight into the shared map.
struct MemoryWriter {
    store: MemoryStore,
    name: String,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut inner = self.store.lock();
        if inner.fail_writes {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        match inner.entries.get_mut(&self.name) {
            Some(entry) => {
                entry.data.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotFound,
                "entry removed while writing",
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
