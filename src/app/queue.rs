use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Runs annotation jobs on the tokio runtime, capping how many run at once.
/// Queued jobs wait for a permit; nothing is ever dropped.
#[derive(Debug, Clone)]
pub struct JobQueue {
    permits: Arc<Semaphore>,
}

impl JobQueue {
    pub fn new(max_concurrent_jobs: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    pub fn spawn<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                // The semaphore is never closed; reachable only during shutdown.
                return;
            };
            job.await;
        });
    }
}
