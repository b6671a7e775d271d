use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::app::launcher::JobLauncher;
use crate::app::model::{JobStatus, StartJobRequest};
use crate::app::queue::JobQueue;
use crate::app::registry::InMemoryJobRegistry;
use crate::cli::AnnotateArgs;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs the whole pipeline in one process: parse the book file, launch an
/// annotation job, poll it to a terminal status, then bundle the enriched
/// document into a zip.
pub async fn run(args: AnnotateArgs) -> anyhow::Result<()> {
    if args.out.exists() && !args.force {
        anyhow::bail!("output already exists: {}", args.out.display());
    }

    let document = crate::parse::parse_file(&args.input)
        .with_context(|| format!("parse book file: {}", args.input.display()))?;
    let title = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("annotated_book")
        .to_owned();

    let api_key = match args.api_key {
        Some(key) => key,
        None => std::env::var("OPENAI_API_KEY").unwrap_or_default(),
    };

    let launcher = JobLauncher::new(Arc::new(InMemoryJobRegistry::new()), JobQueue::new(1));
    let job_id = launcher
        .start(StartJobRequest {
            document,
            identity: args.name,
            engine: args.engine,
            api_key,
            model: args.openai_model,
            base_url: args.openai_base_url,
            delay_ms: args.delay_ms,
        })
        .await
        .context("start job")?;
    tracing::info!(job_id, "annotation job started");

    let job = launcher
        .wait(&job_id, POLL_INTERVAL)
        .await
        .context("wait for job")?;
    if job.status == JobStatus::Failed {
        let message = job
            .message
            .unwrap_or_else(|| "unknown error".to_owned());
        anyhow::bail!("annotation failed: {message}");
    }
    let data = job
        .data
        .ok_or_else(|| anyhow::anyhow!("job completed without a document"))?;

    let bytes = crate::bundle::bundle(&data, &title).context("bundle")?;
    write_output(&args.out, &bytes, args.force)?;
    tracing::info!(out = %args.out.display(), "wrote annotated bundle");
    Ok(())
}

fn write_output(path: &Path, contents: &[u8], force: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("open output: {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("write output: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush output: {}", path.display()))?;
    Ok(())
}
