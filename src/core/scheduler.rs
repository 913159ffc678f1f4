use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A deferred job with cancel-and-reschedule semantics: scheduling a new
/// job aborts the previously pending one, so only the latest state ever
/// reaches the backend. Timer-agnostic from the caller's perspective.
#[derive(Debug)]
pub struct DebouncedTask {
    delay: Duration,
    handle: Option<JoinHandle<()>>,
}

impl DebouncedTask {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: None,
        }
    }

    /// Schedule `job` to run after the configured delay, cancelling any
    /// still-pending job.
    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Wait for the pending job, if any, to finish. Used on shutdown so a
    /// scheduled write is not lost.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for DebouncedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
