//! Debounced filter input.
//!
//! Every keystroke schedules a deferred delivery of the filter text. A newer
//! keystroke supersedes the pending one, so only the text typed last before a
//! quiet period of `delay` is ever delivered.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Cancellable deferred delivery of filter text.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct FilterDebouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<String>,
}

impl FilterDebouncer {
    /// Creates a debouncer and the receiver its settled filter text arrives on.
    #[must_use]
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
            tx,
        };
        (debouncer, rx)
    }

    /// Schedules `text` for delivery after the debounce window, superseding
    /// any pending delivery.
    ///
    /// Nothing is scheduled once the receiver is gone.
    pub fn schedule(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.abort_pending();
        if self.tx.is_closed() {
            debug!(filter = %text, "filter receiver dropped, not scheduling");
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let tx = self.tx.clone();
        let delay = self.delay;

        trace!(generation, filter = %text, "scheduling filter");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A newer schedule may have raced the abort.
            if current.load(Ordering::SeqCst) == generation && tx.send(text).is_err() {
                debug!(generation, "filter receiver dropped before delivery");
            }
        }));
    }

    /// Drops any pending delivery.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_pending();
    }

    /// Returns true if a delivery is scheduled and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// The debounce window.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for FilterDebouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(200);

    #[tokio::test(start_paused = true)]
    async fn delivers_after_quiet_period() {
        let (mut debouncer, mut rx) = FilterDebouncer::new(DELAY);
        debouncer.schedule("fed");

        sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(150)).await;
        assert_eq!(rx.try_recv().ok().as_deref(), Some("fed"));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_keystroke_supersedes_pending() {
        let (mut debouncer, mut rx) = FilterDebouncer::new(DELAY);
        debouncer.schedule("f");
        sleep(Duration::from_millis(50)).await;
        debouncer.schedule("fe");
        sleep(Duration::from_millis(50)).await;
        debouncer.schedule("fed");

        assert_eq!(rx.recv().await.as_deref(), Some("fed"));

        sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_text() {
        let (mut debouncer, mut rx) = FilterDebouncer::new(DELAY);
        debouncer.schedule("fed");
        debouncer.cancel();

        sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_stops_scheduling() {
        let (mut debouncer, rx) = FilterDebouncer::new(DELAY);
        debouncer.schedule("f");
        drop(rx);

        sleep(Duration::from_secs(1)).await;
        assert!(!debouncer.is_pending());

        debouncer.schedule("fe");
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_each_deliver() {
        let (mut debouncer, mut rx) = FilterDebouncer::new(DELAY);
        debouncer.schedule("a");
        sleep(Duration::from_millis(300)).await;
        debouncer.schedule("ab");
        sleep(Duration::from_millis(300)).await;

        assert_eq!(rx.try_recv().ok().as_deref(), Some("a"));
        assert_eq!(rx.try_recv().ok().as_deref(), Some("ab"));
    }
}
