//! Owner-lifetime signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Hooks {
    raised: bool,
    pending: Vec<Hook>,
}

/// Flag raised once when whatever owns a session goes away.
///
/// Clones share the flag. Raising it is permanent.
#[derive(Clone, Default)]
pub struct OwnerSignal {
    gone: Arc<AtomicBool>,
    notify: Arc<Notify>,
    hooks: Arc<Mutex<Hooks>>,
}

impl OwnerSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_gone(&self) -> bool {
        self.gone.load(Ordering::SeqCst)
    }

    /// Run every hook, then mark the owner as gone and wake every waiter.
    ///
    /// Hooks have finished before [`is_gone`](Self::is_gone) reports `true`.
    pub fn signal(&self) {
        let pending = {
            let mut hooks = self.hooks.lock();
            if hooks.raised {
                return;
            }
            hooks.raised = true;
            std::mem::take(&mut hooks.pending)
        };
        tracing::debug!(hooks = pending.len(), "Owner signalled gone");
        for hook in pending {
            hook();
        }
        self.gone.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Run `hook` on the thread that raises the signal.
    ///
    /// Runs immediately if the signal is already raised.
    pub fn on_gone<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut hooks = self.hooks.lock();
            if !hooks.raised {
                hooks.pending.push(Box::new(hook));
                return;
            }
        }
        hook();
    }

    /// Guard that raises the signal when dropped.
    pub fn guard(&self) -> OwnerGuard {
        OwnerGuard {
            signal: self.clone(),
        }
    }

    pub async fn wait(&self) {
        // Subscribe before checking the flag so a concurrent signal() is not lost
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_gone() {
            return;
        }
        notified.await;
    }
}

impl std::fmt::Debug for OwnerSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerSignal")
            .field("gone", &self.is_gone())
            .finish()
    }
}

/// Raises its [`OwnerSignal`] on drop.
///
/// Hold one for as long as the owning screen or task is alive.
#[derive(Debug)]
pub struct OwnerGuard {
    signal: OwnerSignal,
}

impl Drop for OwnerGuard {
    fn drop(&mut self) {
        self.signal.signal();
    }
}
