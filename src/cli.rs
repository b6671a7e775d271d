use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Annotate(AnnotateArgs),
    Parse(ParseArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplainEngine {
    /// Offline engine; echoes prompts back as explanations.
    Noop,
    /// OpenAI Responses API.
    Openai,
}

#[derive(Args)]
pub struct AnnotateArgs {
    /// Input book file (paragraphs separated by blank lines, `{-Title-}`
    /// chapter markers, `[IMAGE: URL]` image markers).
    #[arg(long)]
    pub input: PathBuf,

    /// Output path for the annotated bundle (zip).
    #[arg(long)]
    pub out: PathBuf,

    /// Reader display name, embedded in every explanation prompt.
    #[arg(long)]
    pub name: String,

    /// Explanation engine.
    #[arg(long, value_enum, default_value_t = ExplainEngine::Noop)]
    pub engine: ExplainEngine,

    /// OpenAI API key (default: the OPENAI_API_KEY environment variable).
    #[arg(long)]
    pub api_key: Option<String>,

    /// OpenAI model.
    #[arg(long, default_value = crate::openai::DEFAULT_MODEL)]
    pub openai_model: String,

    /// OpenAI API base URL.
    #[arg(long, default_value = crate::openai::DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Delay after each successful generator call (rate limiting).
    #[arg(long, default_value_t = 1500)]
    pub delay_ms: u64,

    /// Overwrite the output file if it exists.
    #[arg(long)]
    pub force: bool,
}

// Manual impl so debug-logging the parsed CLI never writes the credential to
// stderr.
impl std::fmt::Debug for AnnotateArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotateArgs")
            .field("input", &self.input)
            .field("out", &self.out)
            .field("name", &self.name)
            .field("engine", &self.engine)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("delay_ms", &self.delay_ms)
            .field("force", &self.force)
            .finish()
    }
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Input book file; the parsed document is printed as JSON.
    #[arg(long)]
    pub input: PathBuf,
}
