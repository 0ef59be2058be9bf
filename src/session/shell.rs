//! Interactive shell session.
//!
//! # Architecture
//!
//! ```text
//! send()/close() ──mpsc──→ actor task ──→ ShellStream
//!                              │
//!                  Data/Closed/Failed events
//!                              ↓
//!              output buffer + on_output / on_ended
//! ```
//!
//! The actor task is the only reader and the only writer of the stream.
//! Commands are preferred over stream events, so once a close has been
//! queued no further chunk is delivered. Every delivery is gated on the
//! state being `Ready`.

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify::classify;
use crate::error::{EndReason, SessionError};
use crate::mvi::Reducer;
use crate::transport::{RawSignal, ShellStream, StreamEvent};

use super::intent::SessionIntent;
use super::reducer::SessionReducer;
use super::state::ConnectionState;

/// Handler invoked with each output chunk.
pub type OutputCallback = Box<dyn FnMut(&[u8]) + Send>;

/// Handler invoked once when the session ends.
pub type EndedCallback = Box<dyn FnOnce(EndReason) + Send>;

enum Command {
    Write(Vec<u8>),
    Close,
}

struct Inner {
    state: ConnectionState,
    reason: Option<EndReason>,
    output: Vec<u8>,
    history: Vec<String>,
}

#[derive(Default)]
struct Callbacks {
    muted: bool,
    fired: Option<EndReason>,
    output: Vec<OutputCallback>,
    ended: Vec<EndedCallback>,
}

struct Shared {
    id: Uuid,
    // Held for the whole of a handler run. Reentrant so a handler may call
    // back into its own session; other threads wait for the run to finish.
    firing: ReentrantMutex<()>,
    // Lock order: firing, callbacks, inner. Neither mutex is held while a
    // handler runs.
    inner: Mutex<Inner>,
    callbacks: Mutex<Callbacks>,
    done: watch::Sender<Option<EndReason>>,
}

impl Shared {
    fn dispatch(inner: &mut Inner, intent: SessionIntent) {
        inner.state = SessionReducer::reduce(inner.state, intent);
    }

    /// Move to `Closed`, keeping the first recorded reason.
    fn end(&self, reason: EndReason) -> EndReason {
        let mut inner = self.inner.lock();
        Self::dispatch(&mut inner, SessionIntent::Close);
        *inner.reason.get_or_insert(reason)
    }

    fn is_muted(&self) -> bool {
        self.callbacks.lock().muted
    }

    fn deliver(&self, chunk: &[u8]) {
        let _firing = self.firing.lock();
        let mut handlers = {
            let mut callbacks = self.callbacks.lock();
            {
                let mut inner = self.inner.lock();
                if !inner.state.is_ready() {
                    return;
                }
                inner.output.extend_from_slice(chunk);
            }
            if callbacks.muted {
                return;
            }
            std::mem::take(&mut callbacks.output)
        };

        for callback in handlers.iter_mut() {
            if self.is_muted() {
                return;
            }
            callback(chunk);
        }

        let mut callbacks = self.callbacks.lock();
        if callbacks.muted || callbacks.fired.is_some() {
            return;
        }
        // Keep registration order: handlers added during the run go last
        let added = std::mem::replace(&mut callbacks.output, handlers);
        callbacks.output.extend(added);
    }

    fn fire_ended(&self, reason: EndReason) {
        let _firing = self.firing.lock();
        let handlers = {
            let mut callbacks = self.callbacks.lock();
            if callbacks.fired.is_some() {
                return;
            }
            callbacks.fired = Some(reason);
            callbacks.output.clear();
            std::mem::take(&mut callbacks.ended)
        };

        for callback in handlers {
            if self.is_muted() {
                return;
            }
            callback(reason);
        }
    }

    fn finish(&self, reason: EndReason) {
        self.fire_ended(reason);
        self.done.send_replace(Some(reason));
    }
}

/// Live wrapper around one shell stream.
///
/// Cheap to clone; all clones drive the same session. When the last clone is
/// dropped the session closes with [`EndReason::Normal`].
#[derive(Clone)]
pub struct ShellSession {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
}

impl ShellSession {
    /// Take ownership of an open stream and start the session actor.
    pub(crate) fn start<S: ShellStream>(stream: S) -> Self {
        let (done, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            firing: ReentrantMutex::new(()),
            inner: Mutex::new(Inner {
                state: ConnectionState::Ready,
                reason: None,
                output: Vec::new(),
                history: Vec::new(),
            }),
            callbacks: Mutex::new(Callbacks::default()),
            done,
        });
        let (tx, rx) = mpsc::unbounded_channel();

        info!(session_id = %shared.id, "Shell session ready");
        tokio::spawn(run(stream, Arc::clone(&shared), rx));

        Self {
            shared,
            commands: tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.inner.lock().state
    }

    /// Queue `command` plus a line terminator for the remote shell.
    ///
    /// Never suspends. `Ok` means accepted for transmission, in call order.
    pub fn send(&self, command: &str) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock();
        match inner.state {
            ConnectionState::Ready => {}
            ConnectionState::Closed => return Err(SessionError::SessionClosed),
            _ => return Err(SessionError::NotReady),
        }

        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');
        self.commands
            .send(Command::Write(line))
            .map_err(|_| SessionError::SessionClosed)?;
        inner.history.push(command.to_string());
        Ok(())
    }

    /// Register an output handler.
    ///
    /// Called once per chunk, in arrival order, only while `Ready`. A handler
    /// registered from inside another handler sees the next chunk onwards.
    pub fn on_output<F>(&self, callback: F)
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let mut callbacks = self.shared.callbacks.lock();
        if callbacks.muted || callbacks.fired.is_some() {
            return;
        }
        callbacks.output.push(Box::new(callback));
    }

    /// Register an end handler, called exactly once with the end reason.
    ///
    /// If the session has already ended, `callback` runs immediately.
    pub fn on_ended<F>(&self, callback: F)
    where
        F: FnOnce(EndReason) + Send + 'static,
    {
        let fired = {
            let mut callbacks = self.shared.callbacks.lock();
            if callbacks.muted {
                return;
            }
            match callbacks.fired {
                Some(reason) => reason,
                None => {
                    callbacks.ended.push(Box::new(callback));
                    return;
                }
            }
        };
        callback(fired);
    }

    /// Drop every registered handler and refuse new ones.
    ///
    /// Once this returns no handler of this session runs again. Called from
    /// another thread it waits for a handler run in progress to finish; called
    /// from inside a handler it stops the handlers still queued for that run.
    pub fn mute(&self) {
        let _firing = self.shared.firing.lock();
        let mut callbacks = self.shared.callbacks.lock();
        callbacks.muted = true;
        callbacks.output.clear();
        callbacks.ended.clear();
    }

    /// Start closing without waiting for the stream to be released.
    ///
    /// Returns `false` if the session was already closed. No output handler
    /// runs once this returns.
    pub fn request_close(&self) -> bool {
        let _firing = self.shared.firing.lock();
        let mut inner = self.shared.inner.lock();
        if inner.state.is_closed() {
            return false;
        }
        Shared::dispatch(&mut inner, SessionIntent::Close);
        inner.reason.get_or_insert(EndReason::Normal);
        let _ = self.commands.send(Command::Close);
        debug!(session_id = %self.shared.id, "Close requested");
        true
    }

    /// Close the session and wait until the stream has been released.
    ///
    /// Idempotent; never fails.
    pub async fn close(&self) {
        self.request_close();
        self.ended().await;
    }

    /// Wait for the session to end and return why.
    pub async fn ended(&self) -> EndReason {
        let mut done = self.shared.done.subscribe();
        let reason = match done.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => self.end_reason(),
        };
        reason.unwrap_or(EndReason::Normal)
    }

    /// The recorded end reason, once closing has begun.
    pub fn end_reason(&self) -> Option<EndReason> {
        self.shared.inner.lock().reason
    }

    /// Snapshot of all output received while `Ready`.
    pub fn output(&self) -> Vec<u8> {
        self.shared.inner.lock().output.clone()
    }

    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.shared.inner.lock().output).into_owned()
    }

    /// Commands accepted by `send()`, in order.
    pub fn history(&self) -> Vec<String> {
        self.shared.inner.lock().history.clone()
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

async fn run<S: ShellStream>(
    mut stream: S,
    shared: Arc<Shared>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    // Waiters on `done` must be released even if a handler panics.
    let guard = scopeguard::guard(Arc::clone(&shared), |shared| {
        if shared.done.borrow().is_none() {
            let reason = shared.end(EndReason::Normal);
            shared.done.send_replace(Some(reason));
        }
    });

    let reason = loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Write(bytes)) => {
                    if let Err(err) = stream.write(&bytes).await {
                        let kind = classify(&RawSignal::Error(err.clone()));
                        warn!(session_id = %shared.id, kind = %kind, error = %err, "Shell write failed");
                        break shared.end(EndReason::Failure(kind));
                    }
                }
                Some(Command::Close) | None => break shared.end(EndReason::Normal),
            },

            event = stream.next_event() => match event {
                StreamEvent::Data(chunk) => shared.deliver(&chunk),
                StreamEvent::Closed => {
                    debug!(session_id = %shared.id, "Remote closed the shell");
                    break shared.end(EndReason::Normal);
                }
                StreamEvent::Failed(err) => {
                    let kind = classify(&RawSignal::Error(err.clone()));
                    warn!(session_id = %shared.id, kind = %kind, error = %err, "Shell stream failed");
                    break shared.end(EndReason::Failure(kind));
                }
            },
        }
    };

    stream.close().await;
    drop(stream);

    info!(session_id = %shared.id, reason = ?reason, "Shell session ended");
    shared.finish(reason);
    drop(scopeguard::ScopeGuard::into_inner(guard));
}
