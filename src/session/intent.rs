//! Intents for the connection state machine.

use crate::error::FailureKind;
use crate::mvi::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIntent {
    /// `connect()` was called.
    BeginConnect,

    /// The transport opened a shell before the timer fired.
    Established,

    /// The attempt failed or timed out.
    ConnectFailed(FailureKind),

    /// Explicit close, remote close, stream error, or an abandoned attempt.
    Close,
}

impl Intent for SessionIntent {}
