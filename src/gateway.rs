//! File directory gateway.
//!
//! Applies the visibility rules on top of a [`FileStore`]:
//! - only regular files whose name does not start with `.` are visible
//! - listings are ordered by change time, newest first
//! - names are resolved strictly inside the store
//! - uploads get a server-generated name and are streamed under a size limit

use std::path::{Component, Path};
use std::pin::pin;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::FilesConfig;
use crate::store::{DiskStore, FileReader, FileStore, FileWriter};
use crate::{GatewayError, Result};

/// Extension given to every uploaded file.
pub const UPLOAD_EXTENSION: &str = "txt";

/// Number of file fields accepted per upload.
pub const MAX_FILES_PER_UPLOAD: usize = 1;

/// Allowance for multipart boundaries and part headers on top of the file limit.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// A visible file in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// On-disk filename.
    pub name: String,
    /// Filesystem change time.
    pub created_at: DateTime<Utc>,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Allocated 512-byte blocks.
    pub block_count: u64,
}

/// Result of a committed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Generated filename.
    pub name: String,
    /// Bytes written.
    pub size_bytes: u64,
}

/// Upload constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum size of the file field in bytes.
    pub max_file_size: u64,
    /// Maximum length of a multipart field name in bytes.
    pub max_field_name_size: usize,
}

impl UploadLimits {
    /// Limit for the whole request body, enforced before the multipart parser sees it.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD)
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::from(&FilesConfig::default())
    }
}

impl From<&FilesConfig> for UploadLimits {
    fn from(config: &FilesConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_field_name_size: config.max_field_name_size,
        }
    }
}

/// Generate a fresh stored filename: an uppercase UUID v4 plus the upload extension.
pub fn generate_name() -> String {
    let id = Uuid::new_v4().hyphenated().to_string().to_uppercase();
    format!("{id}.{UPLOAD_EXTENSION}")
}

/// Check that `name` is a single path component that may be visible.
///
/// Rejects empty names, dotfiles (which covers `.` and `..`), separators,
/// absolute paths and NUL bytes.
pub fn is_visible_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Gateway over the store. Cheap to share behind an `Arc`.
pub struct FileGateway {
    store: Arc<dyn FileStore>,
    limits: UploadLimits,
}

impl FileGateway {
    /// Create a gateway over any store.
    pub fn new(store: Arc<dyn FileStore>, limits: UploadLimits) -> Self {
        Self { store, limits }
    }

    /// Create a gateway over the directory named in the config.
    pub fn on_disk(config: &FilesConfig) -> Self {
        Self::new(
            Arc::new(DiskStore::new(&config.storage_path)),
            UploadLimits::from(config),
        )
    }

    /// Get the upload constraints.
    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// List visible files, newest first.
    ///
    /// Fails with `StoreUnavailable` if the store itself cannot be read. Entries
    /// that vanish or cannot be stat'ed while listing are skipped.
    pub async fn list(&self) -> Result<Vec<StoredFile>> {
        let names = self.store.entries().await?;

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            if !is_visible_name(&name) {
                continue;
            }
            match self.store.stat(&name).await {
                Ok(stat) if stat.is_file() => files.push(StoredFile {
                    name,
                    created_at: stat.changed_at,
                    size_bytes: stat.size,
                    block_count: stat.blocks,
                }),
                Ok(_) => {}
                Err(e) => tracing::debug!(name = %name, error = %e, "Skipping entry"),
            }
        }

        files.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(files)
    }

    /// Get metadata for a visible file.
    ///
    /// Every failure, whatever its cause, is reported as `NotFound`.
    pub async fn metadata(&self, name: &str) -> Result<StoredFile> {
        if !is_visible_name(name) {
            return Err(GatewayError::NotFound(name.to_string()));
        }

        let stat = self.store.stat(name).await.map_err(|e| {
            tracing::debug!(name = %name, error = %e, "Stat failed");
            GatewayError::NotFound(name.to_string())
        })?;
        if !stat.is_file() {
            return Err(GatewayError::NotFound(name.to_string()));
        }

        Ok(StoredFile {
            name: name.to_string(),
            created_at: stat.changed_at,
            size_bytes: stat.size,
            block_count: stat.blocks,
        })
    }

    /// Open a visible file for streaming, along with its metadata.
    pub async fn open(&self, name: &str) -> Result<(StoredFile, FileReader)> {
        let file = self.metadata(name).await?;
        let reader = self.store.open(name).await.map_err(|e| {
            tracing::debug!(name = %name, error = %e, "Open failed");
            GatewayError::NotFound(name.to_string())
        })?;
        Ok((file, reader))
    }

    /// Stream an upload into a newly generated file.
    ///
    /// The file is created exclusively. If the stream fails, the size limit is
    /// exceeded or a write fails, the partial file is removed and the error returned.
    pub async fn store_upload<S>(&self, chunks: S) -> Result<StoredUpload>
    where
        S: Stream<Item = Result<Bytes>>,
    {
        let name = generate_name();
        let mut writer = self.store.create_new(&name).await?;

        let outcome = self.write_chunks(&mut writer, chunks).await;
        drop(writer);

        match outcome {
            Ok(size_bytes) => {
                tracing::info!(filename = %name, size = size_bytes, "Upload committed");
                Ok(StoredUpload { name, size_bytes })
            }
            Err(e) => {
                self.discard(&name).await;
                Err(e)
            }
        }
    }

    async fn write_chunks<S>(&self, writer: &mut FileWriter, chunks: S) -> Result<u64>
    where
        S: Stream<Item = Result<Bytes>>,
    {
        let write_failure = |e: std::io::Error| GatewayError::WriteFailure(e.to_string());
        let mut chunks = pin!(chunks);
        let mut written: u64 = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            let next = written.saturating_add(chunk.len() as u64);
            if next > self.limits.max_file_size {
                return Err(GatewayError::PayloadTooLarge {
                    limit: self.limits.max_file_size,
                });
            }
            writer.write_all(&chunk).await.map_err(write_failure)?;
            written = next;
        }

        writer.flush().await.map_err(write_failure)?;
        writer.shutdown().await.map_err(write_failure)?;
        Ok(written)
    }

    /// Remove a file created by a failed upload.
    pub async fn discard(&self, name: &str) {
        if let Err(e) = self.store.remove(name).await {
            tracing::error!(filename = %name, error = %e, "Failed to remove partial upload");
        } else {
            tracing::debug!(filename = %name, "Removed partial upload");
        }
    }
}
