//! Connection setup raced against a timeout.
//!
//! The transport chain (`connect` then `open_shell`) runs on its own attempt
//! task and reports over a oneshot. Whoever loses the race is suppressed: a
//! cancelled timer never fires, and a transport result nobody is waiting for
//! is closed by whoever finds it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::config::ConnectionConfig;
use crate::error::{ConnectError, SessionError};
use crate::mvi::Reducer;
use crate::transport::{RawError, RawSignal, ShellStream, Transport};

use super::intent::SessionIntent;
use super::reducer::SessionReducer;
use super::shell::ShellSession;
use super::state::ConnectionState;
use super::timer::ConnectTimer;

/// Connect budget used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);

type AttemptResult<S> = Result<S, RawError>;

enum Outcome<S> {
    Opened(S),
    Failed(RawError),
    TimedOut,
}

/// Drives exactly one connection attempt.
pub struct ConnectionManager<T: Transport> {
    transport: Arc<T>,
    timeout: Duration,
    attempted: AtomicBool,
    state: Arc<Mutex<ConnectionState>>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: Arc<T>, timeout: Duration) -> Self {
        Self {
            transport,
            timeout,
            attempted: AtomicBool::new(false),
            state: Arc::new(Mutex::new(ConnectionState::Idle)),
        }
    }

    pub fn with_default_timeout(transport: Arc<T>) -> Self {
        Self::new(transport, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn dispatch(&self, intent: SessionIntent) -> ConnectionState {
        dispatch(&self.state, intent)
    }

    /// Connect, authenticate and open a shell within the timeout.
    ///
    /// May be called once. Dropping the returned future while it is pending
    /// leaves the manager `Closed` and closes whatever the transport later
    /// produces.
    pub async fn connect(&self, config: ConnectionConfig) -> Result<ShellSession, ConnectError> {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyAttempted.into());
        }
        self.dispatch(SessionIntent::BeginConnect);
        debug!(timeout_ms = self.timeout.as_millis() as u64, "Connecting");

        let abandoned = scopeguard::guard(Arc::clone(&self.state), |state| {
            if *state.lock() == ConnectionState::Connecting {
                dispatch(&state, SessionIntent::Close);
                debug!("Connect attempt abandoned by caller");
            }
        });

        let (tx, rx) = oneshot::channel();
        tokio::spawn(attempt(Arc::clone(&self.transport), config, tx));

        let mut timer = ConnectTimer::start(self.timeout);
        let mut pending = PendingShell::new(rx);

        let outcome = tokio::select! {
            biased;

            result = pending.recv() => {
                timer.cancel();
                result
            }
            _ = timer.expired() => {
                timer.cancel();
                drop(pending);
                Outcome::TimedOut
            }
        };
        drop(scopeguard::ScopeGuard::into_inner(abandoned));

        let signal = match outcome {
            Outcome::Opened(stream) => {
                if self.dispatch(SessionIntent::Established).is_ready() {
                    return Ok(ShellSession::start(stream));
                }
                discard(stream);
                return Err(ConnectError::Cancelled);
            }
            Outcome::Failed(err) => RawSignal::Error(err),
            Outcome::TimedOut => RawSignal::Timeout,
        };

        let kind = classify(&signal);
        self.dispatch(SessionIntent::ConnectFailed(kind));
        match &signal {
            RawSignal::Error(err) => warn!(kind = %kind, error = %err, "Connection failed"),
            RawSignal::Timeout => warn!(kind = %kind, "Connection timed out"),
        }
        Err(ConnectError::Failed(kind))
    }
}

fn dispatch(state: &Mutex<ConnectionState>, intent: SessionIntent) -> ConnectionState {
    let mut state = state.lock();
    *state = SessionReducer::reduce(*state, intent);
    *state
}

/// Transport chain for one attempt.
///
/// The config, and with it the credential, is dropped as soon as `connect`
/// returns. Results nobody is waiting for are released here.
async fn attempt<T: Transport>(
    transport: Arc<T>,
    config: ConnectionConfig,
    tx: oneshot::Sender<AttemptResult<T::Stream>>,
) {
    let connected = transport.connect(&config).await;
    drop(config);

    let handle = match connected {
        Ok(handle) => handle,
        Err(err) => {
            let _ = tx.send(Err(err));
            return;
        }
    };

    if tx.is_closed() {
        debug!("Connected after the attempt was abandoned, disconnecting");
        transport.disconnect(handle).await;
        return;
    }

    let opened = transport.open_shell(handle).await;
    if let Err(Ok(mut stream)) = tx.send(opened) {
        debug!("Shell opened after the attempt was abandoned, closing");
        stream.close().await;
    }
}

/// Receiving end of an attempt.
///
/// Dropping it before a result was taken closes any shell already sitting in
/// the channel; a later one is closed by the attempt task itself.
struct PendingShell<S: ShellStream> {
    rx: Option<oneshot::Receiver<AttemptResult<S>>>,
}

impl<S: ShellStream> PendingShell<S> {
    fn new(rx: oneshot::Receiver<AttemptResult<S>>) -> Self {
        Self { rx: Some(rx) }
    }

    async fn recv(&mut self) -> Outcome<S> {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        let received = rx.await;
        self.rx = None;
        match received {
            Ok(Ok(stream)) => Outcome::Opened(stream),
            Ok(Err(err)) => Outcome::Failed(err),
            Err(_) => Outcome::Failed(RawError::new("connect attempt aborted")),
        }
    }
}

impl<S: ShellStream> Drop for PendingShell<S> {
    fn drop(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        rx.close();
        if let Ok(Ok(stream)) = rx.try_recv() {
            discard(stream);
        }
    }
}

fn discard<S: ShellStream>(mut stream: S) {
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(async move {
                stream.close().await;
            });
        }
        Err(_) => warn!("No runtime to close a discarded shell on"),
    }
}

impl<T: Transport> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("timeout", &self.timeout)
            .field("state", &self.state())
            .finish()
    }
}
