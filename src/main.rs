use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    clarify::logging::init().context("init logging")?;

    let cli = clarify::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        clarify::cli::Command::Annotate(args) => {
            clarify::annotate::run(args).await.context("annotate")?;
        }
        clarify::cli::Command::Parse(args) => {
            let document = clarify::parse::parse_file(&args.input)
                .with_context(|| format!("parse book file: {}", args.input.display()))?;
            let json =
                serde_json::to_string_pretty(&document).context("serialize document")?;
            println!("{json}");
        }
    }

    Ok(())
}
