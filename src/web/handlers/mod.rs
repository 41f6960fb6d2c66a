//! API handlers for the file API.

pub mod file;

pub use file::*;

use crate::config::FilesConfig;
use crate::gateway::FileGateway;

/// Shared application state.
pub struct AppState {
    /// Gateway over the store.
    pub gateway: FileGateway,
}

impl AppState {
    /// Create application state around a gateway.
    pub fn new(gateway: FileGateway) -> Self {
        Self { gateway }
    }

    /// Create application state for the on-disk store named in the config.
    pub fn from_config(config: &FilesConfig) -> Self {
        Self::new(FileGateway::on_disk(config))
    }
}
