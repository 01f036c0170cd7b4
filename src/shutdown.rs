//! Cooperative shutdown for running game sessions.

use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Creates a linked shutdown handle and signal.
#[instrument]
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

/// Requests shutdown of every signal cloned from the same channel.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Requests shutdown. Calling this more than once has no further effect.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        debug!("Shutdown requested");
        self.tx.send_replace(true);
    }
}

/// Observes shutdown requests at each suspension point of a session.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Returns `true` once shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when shutdown is requested.
    ///
    /// If the handle is dropped without requesting shutdown, this never
    /// resolves.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Turns interrupts into a graceful shutdown, escalating on a repeat.
///
/// The first interrupt from `next_interrupt` requests shutdown through
/// `handle`. Returns `true` once a second interrupt arrives, at which point
/// the caller should stop waiting and exit. Returns `false` if the interrupt
/// source fails.
pub async fn watch_interrupts<F, Fut>(mut next_interrupt: F, handle: ShutdownHandle) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        warn!(error = %e, "Cannot listen for interrupts");
        return false;
    }
    info!("Interrupt received, stopping session. Interrupt again to quit");
    handle.shutdown();

    if let Err(e) = next_interrupt().await {
        warn!(error = %e, "Cannot listen for interrupts");
        return false;
    }
    warn!("Second interrupt received");
    true
}
