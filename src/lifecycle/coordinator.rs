//! Exactly-once teardown tied to an owner signal.
//!
//! Teardown is triggered by whichever comes first of: the owner signal, the
//! coordinator being dropped. An explicit [`LifecycleCoordinator::disconnect`]
//! closes the bound session without muting it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::error::{ConnectError, SessionError};
use crate::session::{ConnectionManager, ShellSession};
use crate::transport::Transport;

use super::signal::OwnerSignal;

#[derive(Default)]
struct Binding {
    torn_down: AtomicBool,
    session: Mutex<Option<ShellSession>>,
}

impl Binding {
    fn teardown(&self, cause: &'static str) -> bool {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return false;
        }
        let session = self.session.lock().take();
        match session {
            Some(session) => {
                info!(session_id = %session.id(), cause, "Tearing down session");
                session.mute();
                session.request_close();
            }
            None => debug!(cause, "Teardown with no bound session"),
        }
        true
    }
}

/// Ties a pending connect or a live session to its owner's lifetime.
///
/// Teardown runs inside [`OwnerSignal::signal`], so the bound session is
/// muted before the signal call returns.
pub struct LifecycleCoordinator {
    signal: OwnerSignal,
    binding: Arc<Binding>,
}

impl LifecycleCoordinator {
    pub fn new(signal: OwnerSignal) -> Self {
        let binding = Arc::new(Binding::default());
        let weak: Weak<Binding> = Arc::downgrade(&binding);
        signal.on_gone(move || {
            if let Some(binding) = weak.upgrade() {
                binding.teardown("owner gone");
            }
        });
        Self { signal, binding }
    }

    pub fn signal(&self) -> &OwnerSignal {
        &self.signal
    }

    pub fn is_torn_down(&self) -> bool {
        self.binding.torn_down.load(Ordering::SeqCst)
    }

    /// The currently bound session, if any.
    pub fn session(&self) -> Option<ShellSession> {
        self.binding.session.lock().clone()
    }

    /// Run `manager.connect(config)` unless the owner goes away first.
    ///
    /// If the owner signal wins, the attempt is dropped, anything it later
    /// produces is closed, and `Cancelled` is returned. On success the
    /// session is bound to this coordinator.
    pub async fn connect<T: Transport>(
        &self,
        manager: &ConnectionManager<T>,
        config: ConnectionConfig,
    ) -> Result<ShellSession, ConnectError> {
        if self.is_torn_down() || self.signal.is_gone() {
            return Err(ConnectError::Cancelled);
        }

        let session = tokio::select! {
            biased;

            _ = self.signal.wait() => {
                info!("Owner gone during connect, discarding attempt");
                return Err(ConnectError::Cancelled);
            }
            result = manager.connect(config) => result?,
        };

        if self.signal.is_gone() || self.is_torn_down() {
            info!(session_id = %session.id(), "Owner gone as the shell opened, closing it");
            session.mute();
            session.request_close();
            return Err(ConnectError::Cancelled);
        }
        self.bind(session.clone())
            .map_err(|_| ConnectError::Cancelled)?;
        if self.is_torn_down() {
            return Err(ConnectError::Cancelled);
        }
        Ok(session)
    }

    /// Bind a live session, closing any previously bound one.
    ///
    /// After teardown the session is muted, closed and `SessionClosed` is
    /// returned.
    pub fn bind(&self, session: ShellSession) -> Result<(), SessionError> {
        let previous = {
            let mut bound = self.binding.session.lock();
            if self.binding.torn_down.load(Ordering::SeqCst) {
                drop(bound);
                session.mute();
                session.request_close();
                return Err(SessionError::SessionClosed);
            }
            bound.replace(session)
        };
        if let Some(previous) = previous {
            debug!(session_id = %previous.id(), "Replacing bound session");
            previous.request_close();
        }
        Ok(())
    }

    /// User-initiated disconnect; `on_ended` fires as usual.
    pub async fn disconnect(&self) {
        let session = self.binding.session.lock().take();
        if let Some(session) = session {
            info!(session_id = %session.id(), "Disconnecting");
            session.close().await;
        }
    }
}

impl Drop for LifecycleCoordinator {
    fn drop(&mut self) {
        self.binding.teardown("coordinator dropped");
    }
}

impl std::fmt::Debug for LifecycleCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleCoordinator")
            .field("owner_gone", &self.signal.is_gone())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
