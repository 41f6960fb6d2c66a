//! File handlers for the file API.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::gateway::{FileGateway, StoredUpload, MAX_FILES_PER_UPLOAD};
use crate::web::dto::{FileListResponse, FileMetaResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::GatewayError;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters (including CR and LF) are dropped, quotes and backslashes
/// are replaced in the ASCII fallback, and non-ASCII names are carried in the
/// RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// Translate a multipart decoding error, keeping body-limit rejections distinct.
fn multipart_error(err: MultipartError, max_file_size: u64) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge {
            limit: max_file_size,
        }
    } else {
        GatewayError::MalformedUpload(err.body_text())
    }
}

/// GET /files - List visible files, newest first.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Visible files, most recently changed first", body = FileListResponse),
        (status = 500, description = "Store cannot be read")
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.gateway.list().await?;
    Ok(Json(FileListResponse::from(files)))
}

/// GET /files/:name/meta - Get file metadata.
#[utoipa::path(
    get,
    path = "/files/{name}/meta",
    tag = "files",
    params(
        ("name" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileMetaResponse),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file_meta(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FileMetaResponse>, ApiError> {
    let file = state.gateway.metadata(&name).await?;
    Ok(Json(FileMetaResponse::from(file)))
}

/// GET /files/:name - Download a file.
///
/// The body is streamed from the store.
#[utoipa::path(
    get,
    path = "/files/{name}",
    tag = "files",
    params(
        ("name" = String, Path, description = "Stored filename")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let (file, reader) = state.gateway.open(&name).await?;

    let content_type = mime_guess::from_path(&file.name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&file.name),
        )
        .header(header::CONTENT_LENGTH, file.size_bytes)
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// POST /files - Upload a file.
///
/// Request body: multipart/form-data with exactly one file field. The stored
/// name is generated by the server; the client's filename is ignored.
#[utoipa::path(
    post,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Invalid multipart data, no file, too many files or field name too long"),
        (status = 413, description = "File too large"),
        (status = 500, description = "File could not be written")
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let upload = receive_upload(&state.gateway, &mut multipart).await?;
    Ok(Json(UploadResponse::from(upload)))
}

/// Drive the multipart stream: store the single file field, ignore plain fields.
///
/// Anything going wrong after the file was stored removes it again.
async fn receive_upload(
    gateway: &FileGateway,
    multipart: &mut Multipart,
) -> crate::Result<StoredUpload> {
    let limits = gateway.limits().clone();
    let max_file_size = limits.max_file_size;
    let mut stored: Option<StoredUpload> = None;

    let outcome = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break Ok(()),
            Err(e) => break Err(multipart_error(e, max_file_size)),
        };

        if field.name().map_or(0, str::len) > limits.max_field_name_size {
            break Err(GatewayError::FieldNameTooLong {
                limit: limits.max_field_name_size,
            });
        }
        if field.file_name().is_none() {
            continue;
        }
        if stored.is_some() {
            break Err(GatewayError::TooManyFiles {
                limit: MAX_FILES_PER_UPLOAD,
            });
        }

        let chunks = field.map(move |chunk| chunk.map_err(|e| multipart_error(e, max_file_size)));
        match gateway.store_upload(chunks).await {
            Ok(upload) => stored = Some(upload),
            Err(e) => break Err(e),
        }
    };

    match (outcome, stored) {
        (Ok(()), Some(upload)) => Ok(upload),
        (Ok(()), None) => Err(GatewayError::MissingFile),
        (Err(e), Some(upload)) => {
            gateway.discard(&upload.name).await;
            Err(e)
        }
        (Err(e), None) => Err(e),
    }
}
