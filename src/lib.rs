//! filegate - a flat-directory HTTP file gateway.
//!
//! Lists, serves and accepts files in a single store directory.

pub mod config;
pub mod datetime;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{GatewayError, Result};
pub use gateway::{FileGateway, StoredFile, StoredUpload, UploadLimits};
pub use store::{DiskStore, FileStore, MemoryStore};
pub use web::WebServer;
