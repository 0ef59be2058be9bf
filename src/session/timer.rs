//! Owned, cancellable timer for the connect race.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// One-shot timer running on its own task.
///
/// Once `cancel()` returns, `expired()` never completes. Dropping the timer
/// cancels it.
pub struct ConnectTimer {
    fired: oneshot::Receiver<()>,
    task: Option<JoinHandle<()>>,
}

impl ConnectTimer {
    pub fn start(duration: Duration) -> Self {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(());
        });
        Self {
            fired: rx,
            task: Some(task),
        }
    }

    /// Wait for expiry. Pending forever once cancelled.
    pub async fn expired(&mut self) {
        if self.task.is_none() || (&mut self.fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.fired.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for ConnectTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
