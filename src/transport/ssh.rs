//! SSH transport over `russh`.
//!
//! Password authentication, one PTY-backed interactive shell per
//! connection. Host keys are accepted with a warning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, TerminalConfig};
use crate::transport::{ErrorLayer, RawError, ShellStream, StreamEvent, Transport};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// SSH client transport.
#[derive(Debug, Clone)]
pub struct SshTransport {
    term: String,
    cols: u32,
    rows: u32,
}

impl SshTransport {
    pub fn new(terminal: &TerminalConfig) -> Self {
        Self {
            term: terminal.term.clone(),
            cols: u32::from(terminal.cols),
            rows: u32::from(terminal.rows),
        }
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new(&TerminalConfig::default())
    }
}

/// SSH client handler.
struct SshHandler;

#[async_trait]
impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        warn!("Host key verification not implemented, accepting key");
        Ok(true)
    }
}

/// Authenticated SSH connection without a shell.
pub struct SshHandle {
    session: client::Handle<SshHandler>,
}

impl SshHandle {
    async fn disconnect(self) {
        if let Err(e) = self
            .session
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            debug!(error = %e, "SSH disconnect failed");
        }
    }
}

fn raw_error(err: russh::Error) -> RawError {
    match err {
        russh::Error::IO(io) => RawError::from(io),
        other => RawError::protocol(other.to_string()),
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Handle = SshHandle;
    type Stream = SshShellStream;

    async fn connect(&self, config: &ConnectionConfig) -> Result<SshHandle, RawError> {
        debug!("Connecting via SSH");

        let tcp = TcpStream::connect((config.host(), config.port())).await?;
        let _ = tcp.set_nodelay(true);

        let ssh_config = Arc::new(client::Config {
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            ..Default::default()
        });
        let mut session = client::connect_stream(ssh_config, tcp, SshHandler)
            .await
            .map_err(raw_error)?;
        debug!("SSH handshake complete");

        let authenticated = session
            .authenticate_password(config.username(), config.credential().expose())
            .await
            .map_err(raw_error)?;

        let handle = SshHandle { session };
        if !authenticated {
            handle.disconnect().await;
            return Err(RawError::new("authentication failed: password rejected"));
        }

        info!("SSH authentication successful");
        Ok(handle)
    }

    async fn open_shell(&self, handle: SshHandle) -> Result<SshShellStream, RawError> {
        let channel = match handle.session.channel_open_session().await {
            Ok(channel) => channel,
            Err(e) => {
                handle.disconnect().await;
                return Err(raw_error(e));
            }
        };

        let setup = async {
            channel
                .request_pty(false, &self.term, self.cols, self.rows, 0, 0, &[])
                .await?;
            channel.request_shell(true).await
        };
        if let Err(e) = setup.await {
            handle.disconnect().await;
            return Err(raw_error(e));
        }

        debug!("SSH shell established");
        Ok(SshShellStream {
            channel,
            handle: Some(handle),
            exited: false,
        })
    }

    async fn disconnect(&self, handle: SshHandle) {
        handle.disconnect().await;
    }
}

/// Interactive shell channel plus the connection that carries it.
pub struct SshShellStream {
    channel: russh::Channel<client::Msg>,
    handle: Option<SshHandle>,
    /// The remote shell reported how it ended.
    exited: bool,
}

/// Event for a channel that stopped producing messages without `Eof` or
/// `Close`. Without an exit report the connection itself went away.
fn channel_gone(exited: bool) -> StreamEvent {
    if exited {
        return StreamEvent::Closed;
    }
    StreamEvent::Failed(RawError {
        code: Some("ECONNRESET".to_string()),
        message: "connection lost".to_string(),
        layer: ErrorLayer::Io,
    })
}

#[async_trait]
impl ShellStream for SshShellStream {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), RawError> {
        if self.handle.is_none() {
            return Err(RawError::new("channel closed"));
        }
        self.channel.data(bytes).await.map_err(raw_error)
    }

    async fn next_event(&mut self) -> StreamEvent {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => return StreamEvent::Data(data.to_vec()),
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    return StreamEvent::Data(data.to_vec())
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!(exit_status, "Remote shell exited");
                    self.exited = true;
                }
                Some(ChannelMsg::ExitSignal { signal_name, .. }) => {
                    debug!(signal = ?signal_name, "Remote shell killed by signal");
                    self.exited = true;
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) => return StreamEvent::Closed,
                None => {
                    let closed_locally = self.handle.is_none();
                    let disconnected = self
                        .handle
                        .as_ref()
                        .map_or(true, |handle| handle.session.is_closed());
                    debug!(disconnected, "SSH channel ended");
                    return channel_gone(self.exited || closed_locally);
                }
                Some(_) => {}
            }
        }
    }

    async fn close(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = self.channel.eof().await {
            debug!(error = %e, "SSH channel eof failed");
        }
        if let Err(e) = self.channel.close().await {
            debug!(error = %e, "SSH channel close failed");
        }
        handle.disconnect().await;
    }
}
