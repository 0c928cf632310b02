//! Graceful shutdown.
//!
//! [`ShutdownSignal`] fans a single stop request out to the accept loop and
//! every open connection. [`ConnectionTracker`] counts live connections so
//! the server can wait for them to drain, up to the configured shutdown
//! timeout.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

/// A cloneable stop request.
///
/// ```rust
/// use cfgate_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
/// shutdown.trigger();
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Creates a signal triggered by SIGINT or SIGTERM.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }

    /// Requests shutdown. Later calls do nothing.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // No receivers is fine.
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// A future resolving when shutdown is requested, immediately if it
    /// already was.
    pub fn recv(&self) -> impl Future<Output = ()> + Send + 'static {
        // Subscribe before reading the flag so a concurrent trigger is seen
        // by one or the other.
        let mut receiver = self.sender.subscribe();
        let triggered = Arc::clone(&self.triggered);
        async move {
            if triggered.load(Ordering::SeqCst) {
                return;
            }
            let _ = receiver.recv().await;
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(err), _) | (_, Err(err)) => {
            tracing::error!(error = %err, "cannot install signal handlers, falling back to ctrl-c");
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c, shutting down"),
        Err(err) => {
            tracing::error!(error = %err, "cannot listen for ctrl-c; only programmatic shutdown remains");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts open connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            drained: Arc::clone(&self.drained),
        }
    }

    /// Open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once no connection is open.
    pub async fn drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Keeps one connection counted in its [`ConnectionTracker`].
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_trigger_is_idempotent_and_shared() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_shutdown());

        signal.trigger();
        signal.trigger();
        assert!(clone.is_shutdown());
    }

    #[test]
    fn test_recv_pending_until_triggered() {
        let signal = ShutdownSignal::new();
        let mut recv = task::spawn(signal.recv());
        assert_pending!(recv.poll());

        signal.trigger();
        assert!(recv.is_woken());
        assert_ready!(recv.poll());
    }

    #[test]
    fn test_recv_after_trigger_is_ready() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        let mut recv = task::spawn(signal.recv());
        assert_ready!(recv.poll());
    }

    #[test]
    fn test_tracker_counts_tokens() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(first);
        assert_eq!(tracker.active_connections(), 1);
        drop(second);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_drained_waits_for_last_token() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(50), tracker.drained())
            .await
            .expect("no connections means drained");

        let token = tracker.acquire();
        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.drained().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(token);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("drained after last token")
            .expect("task should not panic");
    }
}
