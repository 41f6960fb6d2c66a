//! Storage primitives for the file gateway.
//!
//! The gateway never touches the filesystem directly. It talks to a
//! [`FileStore`], which exposes the handful of primitives it needs:
//! - enumerate the entry names of the store
//! - stat a single entry
//! - open an entry for streaming reads
//! - create a new entry exclusively for streaming writes
//! - remove an entry (used to roll back failed uploads)
//!
//! Implementations receive names that the gateway has already checked to be a
//! single, non-empty path component.

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::Result;

/// Size of the allocation unit reported by `blocks`.
pub const BLOCK_SIZE: u64 = 512;

/// Streaming reader over a stored entry.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Streaming writer into a newly created entry.
pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Kind of a store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Anything else (device, socket, fifo, ...).
    Other,
}

/// Result of a stat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStat {
    /// Entry kind.
    pub kind: EntryKind,
    /// Last status change time.
    pub changed_at: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
    /// Number of allocated 512-byte blocks.
    pub blocks: u64,
}

impl EntryStat {
    /// Whether the entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Capability interface over the store directory.
///
/// Errors:
/// - `entries` fails with `StoreUnavailable` when the store cannot be read.
/// - `stat` and `open` fail with `NotFound` (or `Io`) when the entry cannot be reached.
/// - `create_new` fails with `WriteFailure` if the entry already exists or cannot be created.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List the names of all direct entries of the store.
    async fn entries(&self) -> Result<Vec<String>>;

    /// Stat an entry, following symlinks.
    async fn stat(&self, name: &str) -> Result<EntryStat>;

    /// Open an entry for reading.
    async fn open(&self, name: &str) -> Result<FileReader>;

    /// Create a new entry, failing if one with the same name exists.
    async fn create_new(&self, name: &str) -> Result<FileWriter>;

    /// Remove an entry. Removing a missing entry is not an error.
    async fn remove(&self, name: &str) -> Result<()>;
}

/// Blocks needed to hold `size` bytes, for stores without a native block count.
pub(crate) fn blocks_for(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE)
}
