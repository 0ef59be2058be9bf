//! Raw errors reported by transports.

use std::io;

/// Which layer of the transport produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLayer {
    /// Socket / OS level.
    Io,
    /// Key exchange, packet decoding, channel negotiation.
    Protocol,
    Other,
}

/// Opaque error surfaced by a transport, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawError {
    /// Errno-style code such as `ECONNREFUSED`, when known.
    pub code: Option<String>,
    pub message: String,
    pub layer: ErrorLayer,
}

impl RawError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            layer: ErrorLayer::Other,
        }
    }

    /// Error raised while decoding or negotiating the remote protocol.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            layer: ErrorLayer::Protocol,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl std::fmt::Display for RawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RawError {}

impl From<io::Error> for RawError {
    fn from(err: io::Error) -> Self {
        Self {
            code: io_error_code(&err).map(str::to_string),
            message: err.to_string(),
            layer: ErrorLayer::Io,
        }
    }
}

/// Input to the classifier: either an explicit timer expiry or a raw error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSignal {
    Timeout,
    Error(RawError),
}

impl From<RawError> for RawSignal {
    fn from(err: RawError) -> Self {
        RawSignal::Error(err)
    }
}

#[cfg(unix)]
fn io_error_code(err: &io::Error) -> Option<&'static str> {
    if let Some(errno) = err.raw_os_error() {
        let code = match errno {
            libc::ECONNREFUSED => Some("ECONNREFUSED"),
            libc::ETIMEDOUT => Some("ETIMEDOUT"),
            libc::ENETUNREACH => Some("ENETUNREACH"),
            libc::EHOSTUNREACH => Some("EHOSTUNREACH"),
            _ => None,
        };
        if code.is_some() {
            return code;
        }
    }
    io_kind_code(err.kind())
}

#[cfg(not(unix))]
fn io_error_code(err: &io::Error) -> Option<&'static str> {
    io_kind_code(err.kind())
}

fn io_kind_code(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
        _ => None,
    }
}
