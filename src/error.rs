//! Error taxonomy for connection attempts and shell sessions.
//!
//! Connect-phase failures are described by [`FailureKind`], a closed set used
//! both for user messaging and for assertions. Session-phase misuse is
//! described by [`SessionError`]. Neither carries transport prose; the raw
//! transport error lives in [`crate::transport::RawError`].

use thiserror::Error;

/// Classified outcome of a failed connection attempt or session termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    AuthenticationFailed,
    ConnectionRefused,
    NetworkUnreachable,
    ProtocolError,
    Unknown,
}

impl FailureKind {
    /// User-friendly message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::Timeout => {
                "Connection timed out. Check the network and the server address."
            }
            FailureKind::AuthenticationFailed => {
                "Authentication failed. Check the username and password."
            }
            FailureKind::ConnectionRefused => {
                "Connection refused. Check the server address and port."
            }
            FailureKind::NetworkUnreachable => {
                "Network unreachable. Make sure this device can reach the server."
            }
            FailureKind::ProtocolError => "The server spoke an unexpected protocol.",
            FailureKind::Unknown => "Connection failed.",
        }
    }

    /// Stable identifier for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::AuthenticationFailed => "authentication_failed",
            FailureKind::ConnectionRefused => "connection_refused",
            FailureKind::NetworkUnreachable => "network_unreachable",
            FailureKind::ProtocolError => "protocol_error",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Closed by the user or by the remote shell exiting.
    Normal,
    /// Terminated by a transport error after the session was established.
    Failure(FailureKind),
}

impl EndReason {
    pub fn is_normal(&self) -> bool {
        matches!(self, EndReason::Normal)
    }

    /// User-friendly message for the terminal screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            EndReason::Normal => "Connection closed.",
            EndReason::Failure(kind) => kind.user_message(),
        }
    }
}

/// Usage errors raised by session operations.
///
/// These are local and non-fatal: the caller presents them and lets the
/// user retry or reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is not ready")]
    NotReady,

    #[error("session is closed")]
    SessionClosed,

    #[error("connect was already attempted on this manager")]
    AlreadyAttempted,
}

/// Errors returned by [`crate::session::ConnectionManager::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The attempt failed; terminal for this manager.
    #[error("connection failed: {0}")]
    Failed(FailureKind),

    #[error(transparent)]
    Usage(#[from] SessionError),

    /// The owner went away before the attempt resolved.
    #[error("connection attempt cancelled")]
    Cancelled,
}

impl ConnectError {
    /// The failure kind, if this is a classified connect failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ConnectError::Failed(kind) => Some(*kind),
            _ => None,
        }
    }
}
