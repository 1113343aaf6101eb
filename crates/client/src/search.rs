//! Debounced dispatch for search inputs.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Quiet period between the last keystroke and the network dispatch.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Delays work until the input goes quiet.
///
/// Each submission cancels the previously pending dispatch. Work that has
/// already been dispatched is never cancelled, so a stale response can
/// still resolve after a newer one when the network reorders replies;
/// callers that care must guard on their own state.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedules `work` to start once the quiet period elapses without a
    /// newer submission.
    pub fn submit<F, Fut>(&mut self, work: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            // Detached: a later submission cancels only pending
            // dispatches, never work already under way.
            tokio::spawn(work());
        }));
    }

    /// Drops the pending dispatch, if any. In-flight work keeps running.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_of_rapid_submissions_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for value in [1, 10, 100] {
            let fired = fired.clone();
            debouncer.submit(move || async move {
                fired.fetch_add(value, Ordering::SeqCst);
            });
            sleep(Duration::from_millis(100)).await;
        }

        sleep(Duration::from_millis(400)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatched_work_is_never_cancelled() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        {
            let fired = fired.clone();
            debouncer.submit(move || async move {
                // A slow request already in flight.
                sleep(Duration::from_millis(500)).await;
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        sleep(Duration::from_millis(350)).await;

        {
            let fired = fired.clone();
            debouncer.submit(move || async move {
                fired.fetch_add(10, Ordering::SeqCst);
            });
        }
        sleep(Duration::from_secs(1)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_dispatch() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        {
            let fired = fired.clone();
            debouncer.submit(move || async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        sleep(Duration::from_millis(100)).await;
        debouncer.cancel();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn a_typing_burst_looks_up_only_the_final_term() {
        let looked_up = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::default();

        for term in ["h", "ho", "hosting"] {
            let looked_up = looked_up.clone();
            debouncer.submit(move || async move {
                looked_up.lock().unwrap().push(term.to_string());
            });
            sleep(Duration::from_millis(100)).await;
        }

        sleep(SEARCH_DEBOUNCE).await;
        assert_eq!(*looked_up.lock().unwrap(), ["hosting"]);
    }
}
