//! Environment-driven configuration for the summarizer.
//!
//! Values are read once at process start and handed to the pipeline as an
//! explicit [`PipelineConfig`]; the core never consults the environment
//! itself, so repeated runs with different settings can share a process.

use crate::generation::RetryPolicy;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_CHUNK_SIZE: usize = 6000;
const DEFAULT_CHUNK_OVERLAP: usize = 500;
const DEFAULT_TARGET_SIZE: usize = 6000;
const DEFAULT_CHUNK_BUDGET: usize = 500;
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Loaded values describe an impossible pipeline geometry.
    #[error("Invalid pipeline configuration: {0}")]
    InvalidGeometry(String),
}

/// Runtime configuration for the `minutes` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Ollama runtime that serves generation requests.
    pub ollama_url: String,
    /// Optional default input directory holding `.txt` transcripts.
    pub input_dir: Option<String>,
    /// Optional default output directory for summary artifacts.
    pub output_dir: Option<String>,
    /// Per-request timeout applied to every generation call.
    pub generation_timeout: Duration,
    /// Settings handed to the summarization pipeline.
    pub pipeline: PipelineConfig,
}

/// Settings consumed by the summarization pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Model identifier passed to the generation provider.
    pub model: String,
    /// Chunk window budget in bytes.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in bytes.
    pub overlap: usize,
    /// Size ceiling for the combined narrative summary, in bytes.
    pub target_size: usize,
    /// Response ceiling requested for each chunk summary, in bytes.
    pub chunk_budget: usize,
    /// Retry policy applied to every generation call.
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables, applying defaults and
    /// validating pipeline geometry along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            ollama_url: load_env_optional("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            input_dir: load_env_optional("MINUTES_INPUT_DIR"),
            output_dir: load_env_optional("MINUTES_OUTPUT_DIR"),
            generation_timeout: Duration::from_secs(
                load_env_parsed("GENERATION_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            pipeline: PipelineConfig {
                model: load_env("SUMMARY_MODEL")?,
                chunk_size: load_env_parsed("SUMMARY_CHUNK_SIZE")?.unwrap_or(DEFAULT_CHUNK_SIZE),
                overlap: load_env_parsed("SUMMARY_CHUNK_OVERLAP")?
                    .unwrap_or(DEFAULT_CHUNK_OVERLAP),
                target_size: load_env_parsed("SUMMARY_TARGET_SIZE")?
                    .unwrap_or(DEFAULT_TARGET_SIZE),
                chunk_budget: load_env_parsed("SUMMARY_CHUNK_BUDGET")?
                    .unwrap_or(DEFAULT_CHUNK_BUDGET),
                retry: RetryPolicy {
                    attempts: load_env_parsed("GENERATION_RETRIES")?.unwrap_or(DEFAULT_RETRIES),
                    base_delay: Duration::from_millis(
                        load_env_parsed("GENERATION_RETRY_DELAY_MS")?
                            .unwrap_or(DEFAULT_RETRY_DELAY_MS),
                    ),
                },
            },
        };
        config.pipeline.validate()?;
        tracing::debug!(
            ollama_url = %config.ollama_url,
            model = %config.pipeline.model,
            chunk_size = config.pipeline.chunk_size,
            overlap = config.pipeline.overlap,
            target_size = config.pipeline.target_size,
            "Loaded configuration"
        );
        Ok(config)
    }
}

impl PipelineConfig {
    /// Validate chunk/overlap/target geometry before any document is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidGeometry(
                "chunk size must be greater than zero".into(),
            ));
        }
        if self.overlap == 0 || self.overlap >= self.chunk_size {
            return Err(ConfigError::InvalidGeometry(format!(
                "overlap must satisfy 0 < overlap < chunk size ({} given, chunk size {})",
                self.overlap, self.chunk_size
            )));
        }
        if self.target_size == 0 {
            return Err(ConfigError::InvalidGeometry(
                "target size must be greater than zero".into(),
            ));
        }
        if self.chunk_budget == 0 {
            return Err(ConfigError::InvalidGeometry(
                "chunk summary budget must be greater than zero".into(),
            ));
        }
        if self.retry.attempts == 0 {
            return Err(ConfigError::InvalidGeometry(
                "at least one generation attempt is required".into(),
            ));
        }
        Ok(())
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}
