use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/mobilessh/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("mobilessh").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The connect timeout is non-zero
    /// - The default port is non-zero
    /// - The terminal has a type and a non-empty size
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "connection.timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.connection.default_port == 0 {
            return Err(ConfigError::ValidationError {
                message: "connection.default_port must be in 1-65535".to_string(),
            });
        }

        if self.terminal.term.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "terminal.term must not be empty".to_string(),
            });
        }

        if self.terminal.cols == 0 || self.terminal.rows == 0 {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "terminal size {}x{} is invalid",
                    self.terminal.cols, self.terminal.rows
                ),
            });
        }

        Ok(())
    }
}
