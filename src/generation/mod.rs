//! Abstractions for generating text via a local model provider.
//!
//! The pipeline consumes a single narrow capability: turn a prompt into a
//! bounded response. The production adapter speaks to an Ollama runtime; the
//! trait boundary keeps the pipeline testable with deterministic fakes.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

mod ollama;

pub use ollama::OllamaClient;

/// Errors surfaced while attempting a generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Provider could not be reached or refused the request.
    #[error("generation provider unavailable: {0}")]
    Unavailable(String),
    /// Provider did not answer within the configured timeout.
    #[error("generation request timed out after {0:?}")]
    Timeout(Duration),
    /// Provider answered, but the response could not be used.
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to the generation provider.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully qualified model identifier understood by the provider.
    pub model: String,
    /// Prompt assembled by the pipeline.
    pub prompt: String,
    /// Response size ceiling requested by the caller, in bytes.
    pub max_response_bytes: usize,
}

/// Interface implemented by generation providers.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the given prompt, honoring the response ceiling.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// Reachability snapshot for the generation provider and one model.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    /// Indicates whether the provider endpoint responded successfully.
    pub reachable: bool,
    /// Whether the requested model is currently known to the provider.
    pub model_available: bool,
    /// Optional diagnostic string captured when the provider is unreachable.
    pub error: Option<String>,
}

/// Bounded retry schedule applied to every generation call.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before the first retry; doubles with each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn delay_before(&self, attempt: u32) -> Duration {
        // attempt 1 waits base_delay, attempt 2 waits twice that, and so on.
        self.base_delay
            .saturating_mul(1u32 << (attempt - 1).min(16))
    }
}

/// Issue a generation call, retrying transient failures per the policy.
///
/// Empty responses count as failures. The last error is returned once the
/// attempt budget is exhausted.
pub async fn with_retries(
    client: &dyn GenerationClient,
    request: GenerationRequest,
    policy: RetryPolicy,
) -> Result<String, GenerationError> {
    let mut last_error = GenerationError::Unavailable("no generation attempts were made".into());
    for attempt in 0..policy.attempts {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            tracing::debug!(attempt, ?delay, "retrying generation call");
            tokio::time::sleep(delay).await;
        }
        match client.generate(request.clone()).await {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => {
                last_error =
                    GenerationError::InvalidResponse("provider returned an empty response".into());
            }
            Err(error) => {
                tracing::warn!(attempt, error = %error, "generation call failed");
                last_error = error;
            }
        }
    }
    Err(last_error)
}
