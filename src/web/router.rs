//! Router configuration for the file API.

use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::dto::{FileEntry, FileListResponse, FileMetaResponse, UploadResponse};
use super::handlers::{self, download_file, get_file_meta, list_files, upload_file, AppState};

/// OpenAPI description of the file API.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_files,
        handlers::upload_file,
        handlers::download_file,
        handlers::get_file_meta
    ),
    components(schemas(FileEntry, FileListResponse, FileMetaResponse, UploadResponse)),
    tags((name = "files", description = "Flat file store"))
)]
pub struct ApiDoc;

/// Create the file API router.
///
/// The request body limit covers the largest allowed file plus multipart framing,
/// so oversized uploads are cut off by the transport before they reach the store.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.gateway.limits().body_limit();

    let file_routes = Router::new()
        .route("/files", get(list_files).post(upload_file))
        .route("/files/:name", get(download_file))
        .route("/files/:name/meta", get(get_file_meta))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .merge(file_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the router serving the OpenAPI document.
pub fn create_openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
