//! Simulated transport for demos and offline use.
//!
//! Fakes connect latency and answers a small fixed command set the way a
//! login shell would. It is only used when selected explicitly.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ConnectionConfig, SecureString, SimulatedConfig};
use crate::transport::{RawError, ShellStream, StreamEvent, Transport};

const PROMPT: &str = "$ ";

/// Transport that never touches the network.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    connect_delay: Duration,
    command_delay: Duration,
    password: Option<SecureString>,
    connect_error: Option<RawError>,
}

impl SimulatedTransport {
    pub fn new(connect_delay: Duration, command_delay: Duration) -> Self {
        Self {
            connect_delay,
            command_delay,
            password: None,
            connect_error: None,
        }
    }

    /// No artificial latency.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &SimulatedConfig) -> Self {
        Self::new(
            Duration::from_millis(config.connect_delay_ms),
            Duration::from_millis(config.command_delay_ms),
        )
    }

    /// Only accept this password; anything else fails authentication.
    pub fn with_password(mut self, password: SecureString) -> Self {
        self.password = Some(password);
        self
    }

    /// Fail every connect with this error after the connect delay.
    pub fn with_connect_error(mut self, error: RawError) -> Self {
        self.connect_error = Some(error);
        self
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::from_config(&SimulatedConfig::default())
    }
}

/// Authenticated simulated connection.
#[derive(Debug)]
pub struct SimulatedHandle {
    username: String,
    target: String,
}

#[async_trait]
impl Transport for SimulatedTransport {
    type Handle = SimulatedHandle;
    type Stream = SimulatedStream;

    async fn connect(&self, config: &ConnectionConfig) -> Result<SimulatedHandle, RawError> {
        tokio::time::sleep(self.connect_delay).await;

        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }
        if let Some(expected) = &self.password {
            if expected.expose() != config.credential().expose() {
                return Err(RawError::new("authentication failed: permission denied"));
            }
        }

        tracing::debug!("Simulated connection established");
        Ok(SimulatedHandle {
            username: config.username().to_string(),
            target: config.target(),
        })
    }

    async fn open_shell(&self, handle: SimulatedHandle) -> Result<SimulatedStream, RawError> {
        Ok(SimulatedStream::spawn(handle, self.command_delay))
    }

    async fn disconnect(&self, _handle: SimulatedHandle) {
        tracing::debug!("Simulated connection dropped");
    }
}

/// Shell stream backed by a local task playing the remote side.
pub struct SimulatedStream {
    input: Option<mpsc::UnboundedSender<Vec<u8>>>,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    remote: Option<JoinHandle<()>>,
}

impl SimulatedStream {
    fn spawn(handle: SimulatedHandle, command_delay: Duration) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let remote = tokio::spawn(run_remote(handle, command_delay, input_rx, event_tx));
        Self {
            input: Some(input_tx),
            events: event_rx,
            remote: Some(remote),
        }
    }
}

#[async_trait]
impl ShellStream for SimulatedStream {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), RawError> {
        let Some(input) = self.input.as_ref() else {
            return Err(RawError::new("channel closed"));
        };
        input
            .send(bytes.to_vec())
            .map_err(|_| RawError::new("channel closed"))
    }

    async fn next_event(&mut self) -> StreamEvent {
        self.events.recv().await.unwrap_or(StreamEvent::Closed)
    }

    async fn close(&mut self) {
        self.input = None;
        if let Some(remote) = self.remote.take() {
            remote.abort();
        }
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        if let Some(remote) = self.remote.take() {
            remote.abort();
        }
    }
}

async fn run_remote(
    handle: SimulatedHandle,
    command_delay: Duration,
    mut input: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::UnboundedSender<StreamEvent>,
) {
    let banner = format!(
        "Connected to {}\n\nWelcome to MobileSSH\nType a command to get started...\n\n{}",
        handle.target, PROMPT
    );
    if events.send(StreamEvent::Data(banner.into_bytes())).is_err() {
        return;
    }

    let mut pending = Vec::new();
    while let Some(bytes) = input.recv().await {
        pending.extend_from_slice(&bytes);
        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            let command = String::from_utf8_lossy(&line[..line.len() - 1])
                .trim()
                .to_string();

            // PTY-style echo
            let echo = format!("{}\n", command);
            if events.send(StreamEvent::Data(echo.into_bytes())).is_err() {
                return;
            }

            tokio::time::sleep(command_delay).await;

            match respond(&command, &handle.username) {
                Reply::Output(text) => {
                    let out = format!("{}{}", text, PROMPT);
                    if events.send(StreamEvent::Data(out.into_bytes())).is_err() {
                        return;
                    }
                }
                Reply::Logout => {
                    let _ = events.send(StreamEvent::Data(b"logout\n".to_vec()));
                    let _ = events.send(StreamEvent::Closed);
                    return;
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Output(String),
    Logout,
}

fn respond(command: &str, username: &str) -> Reply {
    let output = match command {
        "" => String::new(),
        "ls" | "ls -la" => format!(
            "total 48\n\
             drwxr-xr-x  5 {u} {u} 4096 Feb  8 23:00 .\n\
             drwxr-xr-x 10 {u} {u} 4096 Feb  8 22:00 ..\n\
             -rw-r--r--  1 {u} {u}  220 Feb  8 22:00 .bash_logout\n\
             -rw-r--r--  1 {u} {u} 3526 Feb  8 22:00 .bashrc\n\
             drwxr-xr-x  2 {u} {u} 4096 Feb  8 22:30 Documents\n\
             drwxr-xr-x  2 {u} {u} 4096 Feb  8 22:30 Downloads\n",
            u = username
        ),
        "pwd" => format!("/home/{}\n", username),
        "whoami" => format!("{}\n", username),
        "date" => format!("{}\n", format_date(Utc::now())),
        "clear" => "\x1b[2J\x1b[H".to_string(),
        "exit" | "logout" => return Reply::Logout,
        _ => match command.strip_prefix("echo ") {
            Some(text) => format!("{}\n", text),
            None => format!("bash: {}: command not found\n", command),
        },
    };
    Reply::Output(output)
}

/// Format a timestamp the way `date` prints it in the UTC zone.
fn format_date(at: DateTime<Utc>) -> String {
    at.format("%a %b %e %H:%M:%S UTC %Y").to_string()
}
