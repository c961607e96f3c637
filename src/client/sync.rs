use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Coalesces a burst of updates into a single flush per quiet period.
///
/// Scheduling supersedes whatever flush was pending, so at most one is
/// outstanding at any moment and only the last scheduled state is ever
/// written. Dropping the debouncer cancels the pending flush; a flush can
/// never run on behalf of an owner that is gone.
pub struct Debouncer {
    quiet_period: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: Mutex::new(None),
        }
    }

    /// Runs `flush` once the quiet period elapses with no further schedule
    /// call. Replaces any flush scheduled earlier.
    pub fn schedule<F, Fut>(&self, flush: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let quiet_period = self.quiet_period;
        let handle = tokio::spawn(async move {
            sleep(quiet_period).await;
            flush().await;
        });

        let mut pending = self.pending.lock().unwrap();
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Aborts the pending flush, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn bursts_collapse_into_one_flush() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let flushed = Arc::new(Mutex::new(Vec::new()));

        // Reorders at t=0, t=100 and t=200; only the last state may land.
        for (revision, delay) in [(1u32, 0u64), (2, 100), (3, 100)] {
            time::advance(Duration::from_millis(delay)).await;
            let flushed = Arc::clone(&flushed);
            debouncer.schedule(move || async move {
                flushed.lock().unwrap().push(revision);
            });
            tokio::task::yield_now().await;
        }

        // Quiet until t=699.
        time::advance(Duration::from_millis(499)).await;
        tokio::task::yield_now().await;
        assert!(flushed.lock().unwrap().is_empty());

        // The flush fires at t=700.
        time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(*flushed.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_restarts_the_quiet_period() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        debouncer.schedule(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::task::yield_now().await;

        time::advance(Duration::from_millis(499)).await;
        let counter = Arc::clone(&fired);
        debouncer.schedule(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::task::yield_now().await;

        time::advance(Duration::from_millis(499)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_flush() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        debouncer.schedule(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();

        time::advance(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_debouncer_cancels_the_flush() {
        let fired = Arc::new(AtomicUsize::new(0));

        {
            let debouncer = Debouncer::new(Duration::from_millis(500));
            let counter = Arc::clone(&fired);
            debouncer.schedule(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        time::advance(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
