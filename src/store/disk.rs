//! Filesystem-backed store.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::DateTime;
use tokio::fs;

use super::{EntryKind, EntryStat, FileReader, FileStore, FileWriter};
use crate::{GatewayError, Result};

/// Store backed by a single flat directory.
///
/// Nothing is cached: every call goes back to the filesystem.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is not required to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the store directory if it doesn't exist.
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Resolve `name` to a canonical path that lies inside the store.
    ///
    /// Symlinks are followed; a link whose target leaves the store is treated as absent.
    async fn resolve(&self, name: &str) -> Result<PathBuf> {
        let root = fs::canonicalize(&self.root)
            .await
            .map_err(|_| GatewayError::NotFound(name.to_string()))?;
        let path = fs::canonicalize(root.join(name))
            .await
            .map_err(|_| GatewayError::NotFound(name.to_string()))?;

        if path == root || !path.starts_with(&root) {
            return Err(GatewayError::NotFound(name.to_string()));
        }
        Ok(path)
    }
}

#[async_trait]
impl FileStore for DiskStore {
    async fn entries(&self) -> Result<Vec<String>> {
        let unavailable =
            |e: io::Error| GatewayError::StoreUnavailable(format!("{}: {e}", self.root.display()));

        let mut dir = fs::read_dir(&self.root).await.map_err(unavailable)?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(unavailable)? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::debug!(name = ?raw, "Skipping non UTF-8 entry"),
            }
        }
        Ok(names)
    }

    async fn stat(&self, name: &str) -> Result<EntryStat> {
        let path = self.resolve(name).await?;
        let meta = fs::metadata(&path).await?;
        Ok(entry_stat(&meta))
    }

    async fn open(&self, name: &str) -> Result<FileReader> {
        let path = self.resolve(name).await?;
        let file = fs::File::open(&path).await?;
        Ok(Box::new(file))
    }

    async fn create_new(&self, name: &str) -> Result<FileWriter> {
        let path = self.root.join(name);
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    GatewayError::WriteFailure(format!("{name} already exists"))
                }
                _ => GatewayError::WriteFailure(format!("cannot create {name}: {e}")),
            })?;
        Ok(Box::new(file))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn entry_kind(meta: &Metadata) -> EntryKind {
    if meta.is_file() {
        EntryKind::File
    } else if meta.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::Other
    }
}

#[cfg(unix)]
fn entry_stat(meta: &Metadata) -> EntryStat {
    use std::os::unix::fs::MetadataExt;

    let changed_at =
        DateTime::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32).unwrap_or_default();

    EntryStat {
        kind: entry_kind(meta),
        changed_at,
        size: meta.size(),
        blocks: meta.blocks(),
    }
}

// No ctime or block count outside unix: fall back to mtime and a computed count.
#[cfg(not(unix))]
fn entry_stat(meta: &Metadata) -> EntryStat {
    let changed_at = meta
        .modified()
        .map(DateTime::<chrono::Utc>::from)
        .unwrap_or_default();

    EntryStat {
        kind: entry_kind(meta),
        changed_at,
        size: meta.len(),
        blocks: super::blocks_for(meta.len()),
    }
}
