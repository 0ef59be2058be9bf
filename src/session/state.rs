//! Connection state.

use crate::error::FailureKind;
use crate::mvi::State;

/// Connection state machine.
///
/// `Idle → Connecting → Ready → Closed`, with `Connecting → Failed(kind)` as
/// the terminal state of a failed attempt. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Ready,
    Failed(FailureKind),
    Closed,
}

impl ConnectionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl State for ConnectionState {}
