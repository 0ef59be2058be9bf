//! Application configuration and connection parameters.
//!
//! - `types.rs` / `loader.rs` - TOML config file with defaults
//! - `form.rs` - validation of raw login-form input
//! - `credentials.rs` - secret wrapper for the password

mod credentials;
mod form;
mod loader;
mod types;

pub use credentials::SecureString;
pub use form::{ConnectionConfig, ConnectionForm, ValidationError};
pub use loader::ConfigError;
pub use types::{
    Config, ConnectionDefaults, LoggingConfig, SimulatedConfig, TerminalConfig, TransportConfig,
    TransportMode,
};
