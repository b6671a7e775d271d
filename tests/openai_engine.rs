mod openai_stub;

use std::sync::Arc;
use std::time::Duration;

use clarify::app::launcher::JobLauncher;
use clarify::app::model::{JobStatus, StartJobRequest};
use clarify::app::queue::JobQueue;
use clarify::app::registry::InMemoryJobRegistry;
use clarify::cli::ExplainEngine;
use clarify::document::{AnnotatedItem, Document};
use clarify::worker::FALLBACK_EXPLANATION;

use openai_stub::{OpenAiStub, OpenAiStubConfig};

const POLL: Duration = Duration::from_millis(10);

fn launcher() -> JobLauncher {
    JobLauncher::new(Arc::new(InMemoryJobRegistry::new()), JobQueue::new(2))
}

fn request(base_url: &str, api_key: &str, document: Document) -> StartJobRequest {
    StartJobRequest {
        document,
        identity: "Alice".to_owned(),
        engine: ExplainEngine::Openai,
        api_key: api_key.to_owned(),
        model: "stub-model".to_owned(),
        base_url: base_url.to_owned(),
        delay_ms: 0,
    }
}

fn sample_document() -> Document {
    clarify::parse::parse(
        "{-Chapter One-}\n\nFirst paragraph.\n\nSecond paragraph.\n\n{-Chapter Two-}\n\nThird paragraph.",
    )
}

#[tokio::test]
async fn openai_job_completes_with_stub_explanations() -> anyhow::Result<()> {
    let stub = OpenAiStub::spawn(OpenAiStubConfig {
        expected_api_key: "test-key".to_owned(),
        fail_prompts_containing: None,
    });

    let launcher = launcher();
    let job_id = launcher
        .start(request(&stub.base_url, "test-key", sample_document()))
        .await?;
    let job = launcher.wait(&job_id, POLL).await?;

    assert_eq!(job.status, JobStatus::Complete);
    assert_eq!(job.progress, Some(100));

    let data = job.data.expect("completed job carries the document");
    // The implicit Introduction chapter survives enrichment even when no
    // paragraph precedes the first marker.
    assert_eq!(data.chapters.len(), 3);
    assert_eq!(data.chapters[0].title, "Introduction");
    assert!(data.chapters[0].items.is_empty());
    for chapter in &data.chapters {
        for item in &chapter.items {
            let AnnotatedItem::Text {
                original,
                explanation,
            } = item
            else {
                panic!("expected only text items");
            };
            assert!(
                explanation.starts_with("Stub explanation of: "),
                "unexpected explanation: {explanation}"
            );
            assert!(explanation.contains("Alice"));
            assert!(explanation.contains(original.as_str()));
        }
    }
    Ok(())
}

#[tokio::test]
async fn bad_api_key_fails_the_job_before_any_paragraph() -> anyhow::Result<()> {
    let stub = OpenAiStub::spawn(OpenAiStubConfig {
        expected_api_key: "right-key".to_owned(),
        fail_prompts_containing: None,
    });

    let launcher = launcher();
    let job_id = launcher
        .start(request(&stub.base_url, "wrong-key", sample_document()))
        .await?;
    let job = launcher.wait(&job_id, POLL).await?;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.progress, None);
    let message = job.message.expect("failed job carries a message");
    assert!(
        message.starts_with("API Configuration Error:"),
        "unexpected message: {message}"
    );
    assert!(message.contains("Incorrect API key"));
    assert!(job.data.is_none());
    Ok(())
}

#[tokio::test]
async fn failing_paragraph_gets_fallback_and_job_still_completes() -> anyhow::Result<()> {
    let stub = OpenAiStub::spawn(OpenAiStubConfig {
        expected_api_key: "test-key".to_owned(),
        fail_prompts_containing: Some("Second paragraph".to_owned()),
    });

    let launcher = launcher();
    let job_id = launcher
        .start(request(&stub.base_url, "test-key", sample_document()))
        .await?;
    let job = launcher.wait(&job_id, POLL).await?;

    assert_eq!(job.status, JobStatus::Complete);
    assert_eq!(job.progress, Some(100));

    let data = job.data.expect("completed job carries the document");
    let mut explanations = Vec::new();
    for chapter in &data.chapters {
        for item in &chapter.items {
            if let AnnotatedItem::Text { explanation, .. } = item {
                explanations.push(explanation.clone());
            }
        }
    }
    assert_eq!(explanations.len(), 3);
    assert!(explanations[0].starts_with("Stub explanation of: "));
    assert_eq!(explanations[1], FALLBACK_EXPLANATION);
    assert!(explanations[2].starts_with("Stub explanation of: "));
    Ok(())
}
