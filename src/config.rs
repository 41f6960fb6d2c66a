//! Configuration module for filegate.

use serde::Deserialize;
use std::path::Path;

use crate::{GatewayError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// File store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the store directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum size of an uploaded file field in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum length of a multipart field name in bytes.
    #[serde(default = "default_max_field_name_size")]
    pub max_field_name_size: usize,
    /// Create the store directory at startup if it does not exist.
    #[serde(default)]
    pub create_if_missing: bool,
}

fn default_storage_path() -> String {
    "files".to_string()
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1 MiB
}

fn default_max_field_name_size() -> usize {
    100
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_file_size: default_max_file_size(),
            max_field_name_size: default_max_field_name_size(),
            create_if_missing: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filegate.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// File store configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatewayError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GatewayError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEGATE_STORE_PATH`: store directory
    /// - `FILEGATE_HOST`: bind address
    /// - `FILEGATE_PORT`: listening port (ignored if not a valid port number)
    /// - `FILEGATE_LOG_LEVEL`: log level
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(path) = lookup("FILEGATE_STORE_PATH") {
            self.files.storage_path = path;
        }
        if let Some(host) = lookup("FILEGATE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FILEGATE_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid FILEGATE_PORT"),
            }
        }
        if let Some(level) = lookup("FILEGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the storage path is empty or any upload limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.files.storage_path.trim().is_empty() {
            return Err(GatewayError::Config(
                "files.storage_path must not be empty".to_string(),
            ));
        }
        if self.files.max_file_size == 0 {
            return Err(GatewayError::Config(
                "files.max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.files.max_field_name_size == 0 {
            return Err(GatewayError::Config(
                "files.max_field_name_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
