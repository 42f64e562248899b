//! Command-line interface for the `minutes` binary.

use crate::batch::BatchRunner;
use crate::config::Config;
use crate::generation::OllamaClient;
use crate::pipeline::SummaryService;
use crate::progress::ConsoleSink;
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level argument parser.
#[derive(Debug, Parser)]
#[command(
    name = "minutes",
    version,
    about = "Distill meeting transcripts into structured summaries"
)]
pub struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Summarize every transcript in a directory.
    Run {
        /// Directory holding `.txt` transcripts (falls back to MINUTES_INPUT_DIR).
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory receiving summary artifacts (falls back to MINUTES_OUTPUT_DIR).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the configured model identifier.
        #[arg(long)]
        model: Option<String>,
        /// Override the chunk window budget, in bytes.
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Override the overlap carried between chunks, in bytes.
        #[arg(long)]
        overlap: Option<usize>,
        /// Override the combined-summary size ceiling, in bytes.
        #[arg(long)]
        target_size: Option<usize>,
        /// Re-summarize transcripts even when an up-to-date summary exists.
        #[arg(long)]
        force: bool,
    },
    /// Probe the Ollama runtime and the configured model.
    Check,
}

/// Execute the selected subcommand.
pub async fn execute(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    match cli.command {
        Command::Run {
            input,
            output,
            model,
            chunk_size,
            overlap,
            target_size,
            force,
        } => {
            if let Some(model) = model {
                config.pipeline.model = model;
            }
            if let Some(chunk_size) = chunk_size {
                config.pipeline.chunk_size = chunk_size;
            }
            if let Some(overlap) = overlap {
                config.pipeline.overlap = overlap;
            }
            if let Some(target_size) = target_size {
                config.pipeline.target_size = target_size;
            }
            let input = input
                .or_else(|| config.input_dir.clone().map(PathBuf::from))
                .context("no input directory; pass --input or set MINUTES_INPUT_DIR")?;
            let output = output
                .or_else(|| config.output_dir.clone().map(PathBuf::from))
                .context("no output directory; pass --output or set MINUTES_OUTPUT_DIR")?;

            let client = OllamaClient::new(config.ollama_url.clone(), config.generation_timeout);
            let health = client.probe(&config.pipeline.model).await;
            if !health.reachable {
                tracing::warn!(
                    error = ?health.error,
                    "Ollama is unreachable; generation calls will still be retried per document"
                );
            } else if !health.model_available {
                tracing::warn!(
                    model = %config.pipeline.model,
                    "Model not reported by the runtime; it may be pulled on first use"
                );
            }

            let service = SummaryService::new(
                Box::new(client),
                config.pipeline.clone(),
                Box::new(ConsoleSink),
            )?;
            let runner = BatchRunner::new(service, output, !force);
            let report = runner.run(&input).await?;
            if !report.failed.is_empty() {
                bail!(
                    "{} of {} transcripts failed",
                    report.failed.len(),
                    report.total_files
                );
            }
            Ok(())
        }
        Command::Check => check(&config).await,
    }
}

async fn check(config: &Config) -> anyhow::Result<()> {
    let client = OllamaClient::new(config.ollama_url.clone(), config.generation_timeout);
    let health = client.probe(&config.pipeline.model).await;
    if !health.reachable {
        bail!(
            "Ollama unreachable at {}: {}",
            config.ollama_url,
            health.error.unwrap_or_default()
        );
    }
    if !health.model_available {
        bail!(
            "model '{}' is not available on the runtime",
            config.pipeline.model
        );
    }
    tracing::info!(
        model = %config.pipeline.model,
        url = %config.ollama_url,
        "Ollama is reachable and the model is available"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "minutes",
            "run",
            "--input",
            "in",
            "--output",
            "out",
            "--chunk-size",
            "4000",
            "--force",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                input,
                chunk_size,
                force,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("in")));
                assert_eq!(chunk_size, Some(4000));
                assert!(force);
            }
            Command::Check => panic!("expected run"),
        }
    }

    #[test]
    fn parses_check() {
        let cli = Cli::try_parse_from(["minutes", "check"]).unwrap();
        assert!(matches!(cli.command, Command::Check));
    }
}
