//! Debounced task scheduling
//!
//! One pending-timer handle: scheduling a run cancels the previous pending
//! run, and dropping the handle cancels whatever is left. Cancellation only
//! covers the quiet period; a task whose delay already elapsed runs to
//! completion.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct DebouncedTask {
    pending: Option<CancellationToken>,
}

impl DebouncedTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run after `delay`, cancelling any previously
    /// scheduled run that has not fired yet.
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        let guard = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(delay) => task.await,
            }
        });
        self.pending = Some(token);
    }

    /// Cancel the pending run, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for DebouncedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_fires_after_the_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debounce = DebouncedTask::new();

        debounce.schedule(Duration::from_millis(500), counting_task(&counter));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_cancels_the_pending_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debounce = DebouncedTask::new();

        debounce.schedule(Duration::from_millis(500), counting_task(&counter));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debounce.schedule(Duration::from_millis(500), counting_task(&counter));
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_a_pending_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debounce = DebouncedTask::new();

        debounce.schedule(Duration::from_millis(500), counting_task(&counter));
        debounce.cancel();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_pending_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut debounce = DebouncedTask::new();
            debounce.schedule(Duration::from_millis(500), counting_task(&counter));
        }
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
