use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::app::model::{Job, JobStatus, JobUpdate};

/// Concurrency-safe store mapping job ids to job state. One worker writes each
/// job while any number of pollers read it.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Inserts a new job in `pending` state. The caller guarantees id
    /// uniqueness (a random token).
    async fn create(&self, job_id: &str) -> anyhow::Result<()>;

    /// Atomically replaces the mutable fields of a job.
    async fn update(&self, job_id: &str, update: JobUpdate) -> anyhow::Result<()>;

    /// Returns a snapshot of a job; never a partially-applied update.
    async fn get(&self, job_id: &str) -> anyhow::Result<Option<Job>>;
}

/// Mutex-guarded in-memory map. The lock is held only for the O(1) map
/// copy/replace, never across generator calls, so hold time is independent of
/// document size. Entries live for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Job>> {
        // A poisoned registry lock means a panic while holding it; the map
        // itself is still consistent (single replace per critical section).
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn create(&self, job_id: &str) -> anyhow::Result<()> {
        let job = Job {
            job_id: job_id.to_owned(),
            status: JobStatus::Pending,
            progress: Some(0),
            message: None,
            data: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        let mut jobs = self.lock();
        if jobs.contains_key(job_id) {
            anyhow::bail!("job already exists: {job_id}");
        }
        jobs.insert(job_id.to_owned(), job);
        Ok(())
    }

    async fn update(&self, job_id: &str, update: JobUpdate) -> anyhow::Result<()> {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(job_id) else {
            anyhow::bail!("job not found: {job_id}");
        };
        job.status = update.status;
        job.progress = update.progress;
        job.message = update.message;
        job.data = update.data;
        if update.status.is_terminal() && job.finished_at.is_none() {
            job.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn get(&self, job_id: &str) -> anyhow::Result<Option<Job>> {
        let jobs = self.lock();
        Ok(jobs.get(job_id).cloned())
    }
}
