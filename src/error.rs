//! Error types for filegate.

use thiserror::Error;

/// Common error type for filegate.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The store directory is missing or cannot be read.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The name does not resolve to a visible regular file.
    #[error("{0} not found")]
    NotFound(String),

    /// The uploaded file field exceeded the configured size limit.
    #[error("payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// The upload carried more file fields than allowed.
    #[error("too many files: at most {limit} allowed")]
    TooManyFiles { limit: usize },

    /// A multipart field name exceeded the configured length.
    #[error("field name too long: at most {limit} bytes allowed")]
    FieldNameTooLong { limit: usize },

    /// The upload did not contain a file field.
    #[error("no file provided")]
    MissingFile,

    /// The multipart body could not be decoded.
    #[error("malformed upload: {0}")]
    MalformedUpload(String),

    /// Storage failed while committing an upload.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for filegate operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
