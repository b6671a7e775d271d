use async_trait::async_trait;

/// Failures surfaced by an explanation engine. Configuration errors abort a
/// job before any paragraph is processed; call errors are recovered locally
/// with a placeholder explanation.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Call(String),
}

/// An external text-generation engine.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Validates credentials and engine setup. Called once per job, before the
    /// first paragraph.
    async fn configure(&self) -> Result<(), ProviderError>;

    /// Opens a fresh conversational context. The worker opens one per chapter
    /// so explanations may reference earlier paragraphs of the same chapter
    /// but never leak across chapter boundaries.
    async fn start_context(&self) -> Result<Box<dyn GenerationContext>, ProviderError>;
}

/// One conversation with the engine. Calls share history within the context.
#[async_trait]
pub trait GenerationContext: Send {
    async fn generate(&mut self, prompt: &str) -> Result<String, ProviderError>;
}

/// Offline engine: no credentials, no network. Each call echoes its prompt
/// back as the explanation, which keeps the full pipeline runnable in tests
/// and demos.
#[derive(Debug, Clone, Default)]
pub struct NoopGenerator;

#[async_trait]
impl Generator for NoopGenerator {
    async fn configure(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn start_context(&self) -> Result<Box<dyn GenerationContext>, ProviderError> {
        Ok(Box::new(NoopContext))
    }
}

struct NoopContext;

#[async_trait]
impl GenerationContext for NoopContext {
    async fn generate(&mut self, prompt: &str) -> Result<String, ProviderError> {
        Ok(prompt.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_contexts_echo_the_prompt() -> anyhow::Result<()> {
        let generator = NoopGenerator;
        generator.configure().await?;
        let mut context = generator.start_context().await?;
        let reply = context.generate("Explain this").await?;
        assert_eq!(reply, "Explain this");
        Ok(())
    }
}
