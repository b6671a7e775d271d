use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::app::model::{Job, JobStatusReport, StartJobRequest};
use crate::app::queue::JobQueue;
use crate::app::registry::JobRegistry;
use crate::cli::ExplainEngine;
use crate::openai::OpenAiGenerator;
use crate::provider::{Generator, NoopGenerator};
use crate::worker::AnnotationWorker;

/// Starts annotation jobs and answers status polls. `start` returns as soon as
/// the job is queued; the work proceeds out-of-band.
pub struct JobLauncher {
    registry: Arc<dyn JobRegistry>,
    queue: JobQueue,
}

impl JobLauncher {
    pub fn new(registry: Arc<dyn JobRegistry>, queue: JobQueue) -> Self {
        Self { registry, queue }
    }

    pub fn registry(&self) -> Arc<dyn JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// Launches a job and returns its id immediately. The request is consumed
    /// here: the worker gets its own snapshot of the document, identity, and
    /// credentials, and never reads caller state afterward.
    pub async fn start(&self, request: StartJobRequest) -> anyhow::Result<String> {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.registry
            .create(&job_id)
            .await
            .context("create job record")?;

        let generator = build_generator(&request).context("build generator")?;
        let worker = AnnotationWorker::new(
            Arc::clone(&self.registry),
            generator,
            Duration::from_millis(request.delay_ms),
        );

        let StartJobRequest {
            document, identity, ..
        } = request;
        tracing::info!(job_id, identity, "job queued");

        let task_job_id = job_id.clone();
        self.queue.spawn(async move {
            worker.run(&task_job_id, document, &identity).await;
        });

        Ok(job_id)
    }

    /// Status snapshot for pollers; unknown ids get the distinguished
    /// `not_found` report rather than an error.
    pub async fn status(&self, job_id: &str) -> anyhow::Result<JobStatusReport> {
        let report = match self.registry.get(job_id).await.context("load job")? {
            Some(job) => JobStatusReport::from(&job),
            None => JobStatusReport::not_found(),
        };
        Ok(report)
    }

    /// Polls until the job reaches a terminal status and returns the final
    /// snapshot. Terminal statuses never revert, so the first one seen wins.
    pub async fn wait(&self, job_id: &str, poll_interval: Duration) -> anyhow::Result<Job> {
        loop {
            let job = self
                .registry
                .get(job_id)
                .await
                .context("load job")?
                .ok_or_else(|| anyhow::anyhow!("job not found: {job_id}"))?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

fn build_generator(request: &StartJobRequest) -> anyhow::Result<Arc<dyn Generator>> {
    let generator: Arc<dyn Generator> = match request.engine {
        ExplainEngine::Noop => Arc::new(NoopGenerator),
        ExplainEngine::Openai => Arc::new(OpenAiGenerator::new(
            request.api_key.clone(),
            request.model.clone(),
            &request.base_url,
        )?),
    };
    Ok(generator)
}
