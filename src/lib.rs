//! Remote shell session manager.
//!
//! Races connection setup against a timeout, owns the resulting interactive
//! shell stream, and tears everything down exactly once whoever asks first.
//!
//! - [`session::ConnectionManager`] - one connect attempt with a timeout
//! - [`session::ShellSession`] - live shell: commands in, output out
//! - [`lifecycle::LifecycleCoordinator`] - teardown bound to an owner signal
//! - [`classify`] - transport errors to [`error::FailureKind`]
//! - [`transport`] - SSH and simulated transports

pub mod classify;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod mvi;
pub mod session;
pub mod transport;

pub use error::{ConnectError, EndReason, FailureKind, SessionError};
