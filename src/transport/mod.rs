//! Transport collaborators.
//!
//! A [`Transport`] establishes an authenticated connection and opens an
//! interactive shell on it. The resulting [`ShellStream`] is a byte channel
//! whose push-style notifications are surfaced as typed [`StreamEvent`]s.
//!
//! Implementations:
//! - `ssh.rs` - real SSH over `russh` (feature `ssh`)
//! - `simulated.rs` - local simulation with canned command output

mod error;
pub mod simulated;
#[cfg(feature = "ssh")]
pub mod ssh;

use async_trait::async_trait;

use crate::config::ConnectionConfig;

pub use error::{ErrorLayer, RawError, RawSignal};
pub use simulated::SimulatedTransport;
#[cfg(feature = "ssh")]
pub use ssh::SshTransport;

/// Event delivered by a shell stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Output chunk, in the order the remote produced it.
    Data(Vec<u8>),
    /// The remote closed the shell.
    Closed,
    /// The stream broke after it was established.
    Failed(RawError),
}

/// Secure remote-access client.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Established, authenticated connection.
    type Handle: Send + 'static;
    /// Interactive shell opened on a handle.
    type Stream: ShellStream;

    /// Connect to the host and authenticate.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Self::Handle, RawError>;

    /// Open an interactive shell, taking ownership of the handle.
    ///
    /// On failure the implementation releases the handle itself.
    async fn open_shell(&self, handle: Self::Handle) -> Result<Self::Stream, RawError>;

    /// Release a handle that will never get a shell.
    async fn disconnect(&self, handle: Self::Handle);
}

/// Bidirectional byte channel for one interactive shell.
#[async_trait]
pub trait ShellStream: Send + 'static {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), RawError>;

    /// Wait for the next event.
    ///
    /// Must be cancel-safe: dropping the future before it completes must not
    /// lose data. After `Closed` or `Failed` is returned the stream is not
    /// polled again.
    async fn next_event(&mut self) -> StreamEvent;

    /// End the shell channel, then the connection it runs on.
    ///
    /// Idempotent and infallible; release errors are logged and dropped.
    async fn close(&mut self);
}
