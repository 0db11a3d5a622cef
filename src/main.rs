//! LLM Anonymizer - web front end for document preprocessing.

use clap::Parser;

use llm_anonymizer::{cli, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let log_file = logging::init(cli.debug)?;
    tracing::debug!(log_file = %log_file.display(), "Start LLM Anonymizer");

    cli::run(cli).await
}
