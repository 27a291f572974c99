//! Shutdown signalling and connection tracking.
//!
//! A serve session is coordinated through two primitives: a
//! [`ShutdownSignal`] that any number of tasks can await, and a
//! [`ConnectionTracker`] that counts live connections so the drain phase
//! can wait for them to finish. Both are thin wrappers over a
//! [`watch`](tokio::sync::watch) channel, so waiters never miss a
//! transition that happened before they subscribed.

use std::sync::Arc;

use tokio::sync::watch;

/// A one-way signal that can be triggered once and awaited by many tasks.
///
/// Clones share the same underlying state: triggering any clone wakes every
/// waiter on every clone. Triggering twice is harmless.
///
/// # Example
///
/// ```
/// use stoa_server::ShutdownSignal;
///
/// let signal = ShutdownSignal::new();
/// assert!(!signal.is_triggered());
///
/// signal.trigger();
/// assert!(signal.is_triggered());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    fired: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            fired: Arc::new(sender),
        }
    }

    /// Trips the signal, waking every waiter. Idempotent.
    pub fn trigger(&self) {
        self.fired.send_replace(true);
    }

    /// Returns `true` once the signal has been triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.fired.borrow()
    }

    /// Completes when the signal is triggered.
    ///
    /// Completes immediately if the signal already fired.
    pub async fn triggered(&self) {
        let mut watcher = self.fired.subscribe();
        // The sender outlives this borrow, so the channel cannot close
        // while we wait.
        let _ = watcher.wait_for(|fired| *fired).await;
    }

    /// Creates a signal that trips on SIGTERM or SIGINT.
    ///
    /// # Panics
    ///
    /// Panics if the OS signal handlers cannot be registered.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trip = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trip.trigger();
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for an OS shutdown signal.
///
/// On Unix this is SIGTERM or SIGINT; elsewhere only Ctrl+C.
async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to wait for Ctrl+C");
        tracing::info!("received Ctrl+C, initiating graceful shutdown");
    }
}

/// Counts live connections so the drain phase can wait for zero.
///
/// Each accepted connection holds a [`ConnectionGuard`]; dropping the
/// guard decrements the count and wakes anyone in [`idle`](Self::idle).
///
/// # Example
///
/// ```
/// use stoa_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let guard = tracker.track();
/// assert_eq!(tracker.active(), 1);
///
/// drop(guard);
/// assert_eq!(tracker.active(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    count: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// Creates a tracker with no live connections.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            count: Arc::new(sender),
        }
    }

    /// Registers a live connection.
    ///
    /// The returned guard should be held for the connection's lifetime.
    #[must_use = "dropping the guard immediately untracks the connection"]
    pub fn track(&self) -> ConnectionGuard {
        self.count.send_modify(|count| *count += 1);
        ConnectionGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn active(&self) -> usize {
        *self.count.borrow()
    }

    /// Completes once no tracked connections remain.
    ///
    /// Completes immediately when none are active.
    pub async fn idle(&self) {
        let mut watcher = self.count.subscribe();
        let _ = watcher.wait_for(|count| *count == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one live connection; dropping it decrements the tracker's count.
#[derive(Debug)]
pub struct ConnectionGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.send_modify(|count| *count = count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_signal_starts_untriggered() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
    }

    #[test]
    fn test_signal_trigger() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_signal_trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_signal_clones_share_state() {
        let first = ShutdownSignal::new();
        let second = first.clone();

        first.trigger();

        assert!(first.is_triggered());
        assert!(second.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_completes_when_tripped() {
        let signal = ShutdownSignal::new();
        let trip = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trip.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.triggered())
            .await
            .expect("triggered should complete");
    }

    #[tokio::test]
    async fn test_triggered_completes_immediately_if_already_tripped() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(10), signal.triggered())
            .await
            .expect("triggered should complete immediately");
    }

    #[test]
    fn test_tracker_starts_idle() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active(), 0);
    }

    #[test]
    fn test_tracker_counts_guards() {
        let tracker = ConnectionTracker::new();
        let first = tracker.track();
        let second = tracker.track();
        let third = tracker.track();

        assert_eq!(tracker.active(), 3);

        drop(first);
        assert_eq!(tracker.active(), 2);

        drop(second);
        assert_eq!(tracker.active(), 1);

        drop(third);
        assert_eq!(tracker.active(), 0);
    }

    #[tokio::test]
    async fn test_idle_completes_immediately_with_no_connections() {
        let tracker = ConnectionTracker::new();

        tokio::time::timeout(Duration::from_millis(10), tracker.idle())
            .await
            .expect("idle should complete immediately");
    }

    #[tokio::test]
    async fn test_idle_completes_after_last_guard_drops() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(guard);
        });

        tokio::time::timeout(Duration::from_secs(1), tracker.idle())
            .await
            .expect("idle should complete once the guard drops");
    }

    #[test]
    fn test_defaults() {
        assert!(!ShutdownSignal::default().is_triggered());
        assert_eq!(ConnectionTracker::default().active(), 0);
    }
}
