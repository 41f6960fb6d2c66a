//! API error handling for the file API.
//!
//! Error bodies are short plain-text messages. Filesystem paths and raw I/O
//! errors are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::GatewayError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Not found (404).
    NotFound,
    /// Payload too large (413).
    PayloadTooLarge,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create a not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, "Not Found")
    }

    /// Create a payload too large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message sent to the client.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status_code(), self.message).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(_) => ApiError::not_found(),
            GatewayError::StoreUnavailable(detail) => {
                tracing::error!("Store unavailable: {}", detail);
                ApiError::internal("Error retrieving files")
            }
            GatewayError::PayloadTooLarge { limit } => {
                tracing::warn!(limit, "Upload rejected: file too large");
                ApiError::payload_too_large(format!("File too large (max {limit} bytes)"))
            }
            GatewayError::TooManyFiles { limit } => {
                tracing::warn!(limit, "Upload rejected: too many files");
                ApiError::bad_request(format!("Too many files (max {limit})"))
            }
            GatewayError::FieldNameTooLong { limit } => {
                tracing::warn!(limit, "Upload rejected: field name too long");
                ApiError::bad_request(format!("Field name too long (max {limit} bytes)"))
            }
            GatewayError::MissingFile => ApiError::bad_request("No file provided"),
            GatewayError::MalformedUpload(detail) => {
                tracing::warn!("Malformed upload: {}", detail);
                ApiError::bad_request("Invalid multipart data")
            }
            GatewayError::WriteFailure(detail) => {
                tracing::error!("Failed to save upload: {}", detail);
                ApiError::internal("Failed to save file")
            }
            err @ (GatewayError::Io(_) | GatewayError::Config(_)) => {
                tracing::error!("Internal error: {}", err);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}
