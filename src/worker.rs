use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::app::model::JobUpdate;
use crate::app::registry::JobRegistry;
use crate::document::{AnnotatedChapter, AnnotatedDocument, AnnotatedItem, Document, Item};
use crate::provider::Generator;

/// Explanation recorded when a single generator call fails. The job keeps
/// going; the degraded paragraph stays visible in the output.
pub const FALLBACK_EXPLANATION: &str = "[Could not get an explanation.]";

/// Annotates one parsed document as a background unit of work. All outcomes
/// are reported through the job registry; `run` itself never returns them.
pub struct AnnotationWorker {
    registry: Arc<dyn JobRegistry>,
    generator: Arc<dyn Generator>,
    /// Pause after each successful generator call (rate limiting, not
    /// correctness).
    pacing: Duration,
}

impl AnnotationWorker {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        generator: Arc<dyn Generator>,
        pacing: Duration,
    ) -> Self {
        Self {
            registry,
            generator,
            pacing,
        }
    }

    pub async fn run(&self, job_id: &str, document: Document, identity: &str) {
        if let Err(err) = self.try_run(job_id, document, identity).await {
            // Registry failures only; job-level failures are written as
            // status updates inside try_run.
            tracing::error!(job_id, ?err, "annotation job could not report status");
        }
    }

    async fn try_run(
        &self,
        job_id: &str,
        document: Document,
        identity: &str,
    ) -> anyhow::Result<()> {
        if document.is_empty() {
            tracing::error!(job_id, "document is empty or unparsable");
            self.registry
                .update(job_id, JobUpdate::failed("Failed to parse book file."))
                .await
                .context("mark failed")?;
            return Ok(());
        }

        let total = document.text_item_count();
        if total == 0 {
            // Nothing to enrich; a document of only images and chapter
            // markers is valid and trivially complete.
            self.registry
                .update(
                    job_id,
                    JobUpdate::complete(AnnotatedDocument::passthrough(document)),
                )
                .await
                .context("mark complete")?;
            return Ok(());
        }

        if let Err(err) = self.generator.configure().await {
            tracing::error!(job_id, %err, "generator configuration failed");
            self.registry
                .update(
                    job_id,
                    JobUpdate::failed(format!("API Configuration Error: {err}")),
                )
                .await
                .context("mark failed")?;
            return Ok(());
        }

        tracing::info!(job_id, paragraphs = total, "annotating document");

        let mut annotated = AnnotatedDocument::default();
        let mut processed = 0usize;

        for chapter in document.chapters {
            // Fresh conversational context per chapter: explanations may
            // build on earlier paragraphs of this chapter only.
            let mut context = match self.generator.start_context().await {
                Ok(context) => context,
                Err(err) => {
                    tracing::error!(job_id, chapter = %chapter.title, %err, "start context failed");
                    self.registry
                        .update(
                            job_id,
                            JobUpdate::failed(format!("API Configuration Error: {err}")),
                        )
                        .await
                        .context("mark failed")?;
                    return Ok(());
                }
            };

            let mut items = Vec::with_capacity(chapter.items.len());
            for item in chapter.items {
                match item {
                    Item::Text { content } => {
                        let prompt = format!("Explain this to {identity}: \"{content}\"");
                        let explanation = match context.generate(&prompt).await {
                            Ok(reply) => {
                                let reply = reply.trim().to_owned();
                                tokio::time::sleep(self.pacing).await;
                                reply
                            }
                            Err(err) => {
                                tracing::warn!(job_id, %err, "generator call failed; using placeholder");
                                FALLBACK_EXPLANATION.to_owned()
                            }
                        };
                        items.push(AnnotatedItem::Text {
                            original: content,
                            explanation,
                        });

                        processed += 1;
                        let progress = (processed * 100 / total) as u8;
                        self.registry
                            .update(job_id, JobUpdate::processing(progress))
                            .await
                            .context("update progress")?;
                    }
                    Item::Image { url } => {
                        items.push(AnnotatedItem::Image { url });
                    }
                }
            }

            annotated.chapters.push(AnnotatedChapter {
                title: chapter.title,
                items,
            });
        }

        tracing::info!(job_id, "annotation complete");
        self.registry
            .update(job_id, JobUpdate::complete(annotated))
            .await
            .context("mark complete")?;
        Ok(())
    }
}
