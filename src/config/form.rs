//! Login form validation.
//!
//! The front end collects four raw strings; `ConnectionForm::validate`
//! turns them into a [`ConnectionConfig`] or reports the first problem.

use thiserror::Error;

use super::credentials::SecureString;

/// Reasons a login form is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server address is required")]
    MissingHost,

    #[error("port is required")]
    MissingPort,

    #[error("username is required")]
    MissingUsername,

    #[error("password is required")]
    MissingPassword,

    #[error("port must be between 1 and 65535")]
    InvalidPort,
}

/// Raw, unvalidated login form input.
#[derive(Debug, Clone)]
pub struct ConnectionForm {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: SecureString,
}

impl ConnectionForm {
    /// Validate the form, trimming host, port and username.
    ///
    /// The password is taken verbatim; only emptiness is checked.
    pub fn validate(self) -> Result<ConnectionConfig, ValidationError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ValidationError::MissingHost);
        }
        let port = self.port.trim();
        if port.is_empty() {
            return Err(ValidationError::MissingPort);
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        let port = parse_port(port)?;

        ConnectionConfig::new(host, port, username, self.password)
    }
}

fn parse_port(raw: &str) -> Result<u16, ValidationError> {
    match raw.parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(port as u16),
        _ => Err(ValidationError::InvalidPort),
    }
}

/// Validated parameters for one connection attempt.
///
/// Immutable once built. `Debug` never prints the credential, and the
/// credential is wiped when the config is dropped.
#[derive(Clone)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    username: String,
    credential: SecureString,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        credential: SecureString,
    ) -> Result<Self, ValidationError> {
        let host = host.into();
        let username = username.into();
        if host.trim().is_empty() {
            return Err(ValidationError::MissingHost);
        }
        if port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if username.trim().is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        if credential.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        Ok(Self {
            host,
            port,
            username,
            credential,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn credential(&self) -> &SecureString {
        &self.credential
    }

    /// `user@host:port`, safe to log.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("credential", &self.credential)
            .finish()
    }
}
