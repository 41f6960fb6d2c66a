//! Response DTOs for the file API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime::to_iso8601_millis;
use crate::gateway::{StoredFile, StoredUpload};

/// A single entry in a file listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileEntry {
    /// Stored filename.
    pub filename: String,
}

/// File listing, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    /// Visible files.
    pub files: Vec<FileEntry>,
}

impl From<Vec<StoredFile>> for FileListResponse {
    fn from(files: Vec<StoredFile>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|f| FileEntry { filename: f.name })
                .collect(),
        }
    }
}

/// File metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileMetaResponse {
    /// Stored filename.
    pub filename: String,
    /// Filesystem change time (ISO-8601, UTC, milliseconds).
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Size in bytes.
    pub size: u64,
    /// Allocated 512-byte blocks.
    pub blocks: u64,
}

impl From<StoredFile> for FileMetaResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            created_at: to_iso8601_millis(&file.created_at),
            filename: file.name,
            size: file.size_bytes,
            blocks: file.block_count,
        }
    }
}

/// Upload result.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Always `success`.
    pub status: String,
    /// Generated filename.
    pub filename: String,
}

impl From<StoredUpload> for UploadResponse {
    fn from(upload: StoredUpload) -> Self {
        Self {
            status: "success".to_string(),
            filename: upload.name,
        }
    }
}
