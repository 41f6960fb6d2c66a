//! HTTP interface for filegate.
//!
//! Exposes the gateway operations as a small REST API:
//! - `GET /files` lists visible files
//! - `GET /files/:name` downloads a file
//! - `GET /files/:name/meta` returns file metadata
//! - `POST /files` accepts a single-file multipart upload

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
