//! Shared test utilities: a scriptable stub transport.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mobilessh::config::{ConnectionConfig, SecureString};
use mobilessh::transport::{RawError, ShellStream, StreamEvent, Transport};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Counters and captured I/O shared between a stub transport and the test.
#[derive(Default)]
pub struct StubStats {
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub shells_opened: AtomicUsize,
    pub stream_closes: AtomicUsize,
    pub written: Mutex<Vec<u8>>,
    remotes: Mutex<Vec<mpsc::UnboundedSender<StreamEvent>>>,
}

impl StubStats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn shells_opened(&self) -> usize {
        self.shells_opened.load(Ordering::SeqCst)
    }

    pub fn stream_closes(&self) -> usize {
        self.stream_closes.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().clone()
    }

    /// Push an event from the remote side of the `index`-th opened shell.
    ///
    /// Returns `false` once the session has released the stream.
    pub fn push(&self, index: usize, event: StreamEvent) -> bool {
        match self.remotes.lock().get(index) {
            Some(remote) => remote.send(event).is_ok(),
            None => panic!("no shell #{} was opened", index),
        }
    }

    pub fn push_data(&self, index: usize, chunk: &str) -> bool {
        self.push(index, StreamEvent::Data(chunk.as_bytes().to_vec()))
    }
}

/// Completes a gated transport step.
pub struct Gate {
    tx: oneshot::Sender<Result<(), RawError>>,
}

impl Gate {
    pub fn succeed(self) {
        let _ = self.tx.send(Ok(()));
    }

    pub fn fail(self, error: RawError) {
        let _ = self.tx.send(Err(error));
    }
}

type GateRx = oneshot::Receiver<Result<(), RawError>>;

async fn pass(gate: Option<GateRx>) -> Result<(), RawError> {
    match gate {
        None => Ok(()),
        Some(rx) => match rx.await {
            Ok(result) => result,
            // Gate dropped: this step never resolves
            Err(_) => std::future::pending().await,
        },
    }
}

/// Transport whose connect and open-shell steps are scripted by the test.
#[derive(Default)]
pub struct StubTransport {
    pub stats: Arc<StubStats>,
    connect_gate: Mutex<Option<GateRx>>,
    shell_gate: Mutex<Option<GateRx>>,
    connect_error: Option<RawError>,
    write_error: Option<RawError>,
    hang: bool,
}

impl StubTransport {
    /// Connects and opens a shell immediately.
    pub fn ready() -> Self {
        Self::default()
    }

    /// Connect never resolves.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Connect fails immediately with `error`.
    pub fn failing(error: RawError) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::default()
        }
    }

    /// Opens a shell whose every write fails with `error`.
    pub fn failing_writes(error: RawError) -> Self {
        Self {
            write_error: Some(error),
            ..Self::default()
        }
    }

    /// Connect waits for the returned gate.
    pub fn gated_connect() -> (Self, Gate) {
        let (tx, rx) = oneshot::channel();
        let transport = Self {
            connect_gate: Mutex::new(Some(rx)),
            ..Self::default()
        };
        (transport, Gate { tx })
    }

    /// Connect succeeds; opening the shell waits for the returned gate.
    pub fn gated_shell() -> (Self, Gate) {
        let (tx, rx) = oneshot::channel();
        let transport = Self {
            shell_gate: Mutex::new(Some(rx)),
            ..Self::default()
        };
        (transport, Gate { tx })
    }
}

pub struct StubHandle;

#[async_trait]
impl Transport for StubTransport {
    type Handle = StubHandle;
    type Stream = StubStream;

    async fn connect(&self, _config: &ConnectionConfig) -> Result<StubHandle, RawError> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }
        let gate = self.connect_gate.lock().take();
        pass(gate).await?;
        Ok(StubHandle)
    }

    async fn open_shell(&self, handle: StubHandle) -> Result<StubStream, RawError> {
        let gate = self.shell_gate.lock().take();
        if let Err(err) = pass(gate).await {
            self.disconnect(handle).await;
            return Err(err);
        }

        self.stats.shells_opened.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.stats.remotes.lock().push(tx);
        Ok(StubStream {
            events: rx,
            stats: Arc::clone(&self.stats),
            write_error: self.write_error.clone(),
        })
    }

    async fn disconnect(&self, _handle: StubHandle) {
        self.stats.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Stream fed by [`StubStats::push`].
pub struct StubStream {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    stats: Arc<StubStats>,
    write_error: Option<RawError>,
}

#[async_trait]
impl ShellStream for StubStream {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), RawError> {
        if let Some(error) = &self.write_error {
            return Err(error.clone());
        }
        self.stats.written.lock().extend_from_slice(bytes);
        Ok(())
    }

    async fn next_event(&mut self) -> StreamEvent {
        match self.events.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        // Counts every call so tests can assert release happens once
        self.stats.stream_closes.fetch_add(1, Ordering::SeqCst);
        self.events.close();
    }
}

pub fn config() -> ConnectionConfig {
    ConnectionConfig::new(
        "192.168.1.100",
        22,
        "root",
        SecureString::new("hunter2".to_string()),
    )
    .expect("valid config")
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
