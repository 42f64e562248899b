//! Ollama-backed generation adapter.
//!
//! Mirrors the runtime's non-streaming `/api/generate` contract and exposes a
//! `/api/show` probe used by the `check` command and batch preflight.

use super::{GenerationClient, GenerationError, GenerationRequest, HealthSnapshot};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

// Rough bytes-per-token estimate used to translate a response byte ceiling
// into the runtime's token-count knob.
const BYTES_PER_TOKEN: usize = 4;
const MIN_PREDICT_TOKENS: usize = 64;

/// Generation client backed by a local Ollama runtime.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Construct a client against the given base URL with a per-request timeout.
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent("minutes/generate")
            .timeout(timeout)
            .build()
            .expect("Failed to construct reqwest::Client for generation");
        Self {
            http,
            base_url,
            timeout,
        }
    }

    fn generate_endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn show_endpoint(&self) -> String {
        format!("{}/api/show", self.base_url.trim_end_matches('/'))
    }

    /// Probe the runtime for reachability and model presence.
    ///
    /// Never fails: connectivity problems are folded into the snapshot so
    /// callers can decide whether to proceed.
    pub async fn probe(&self, model: &str) -> HealthSnapshot {
        let payload = json!({ "name": model });
        match self
            .http
            .post(self.show_endpoint())
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => HealthSnapshot {
                reachable: true,
                model_available: true,
                error: None,
            },
            Ok(response) => {
                let status = response.status();
                tracing::warn!(model, %status, "Model lookup returned an error status");
                HealthSnapshot {
                    reachable: true,
                    model_available: false,
                    error: Some(format!("model lookup returned {status}")),
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "Ollama probe failed");
                HealthSnapshot {
                    reachable: false,
                    model_available: false,
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let num_predict = (request.max_response_bytes / BYTES_PER_TOKEN).max(MIN_PREDICT_TOKENS);
        let payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                // Lower temperature for stable, repeatable summaries.
                "temperature": 0.1,
                "num_predict": num_predict,
            }
        });

        let response = self
            .http
            .post(self.generate_endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    GenerationError::Timeout(self.timeout)
                } else {
                    GenerationError::Unavailable(format!(
                        "failed to reach Ollama at {}: {error}",
                        self.base_url
                    ))
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GenerationError::Unavailable(format!(
                "Ollama endpoint {} returned 404",
                self.generate_endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Unavailable(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            GenerationError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(GenerationError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> OllamaClient {
        OllamaClient::new(server.base_url(), Duration::from_secs(5))
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "llama".into(),
            prompt: "Summarize".into(),
            max_response_bytes: 500,
        }
    }

    #[tokio::test]
    async fn generate_handles_successful_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "Summary text",
                    "done": true
                }));
            })
            .await;

        let text = client_for(&server).generate(request()).await.unwrap();
        mock.assert();
        assert_eq!(text, "Summary text");
    }

    #[tokio::test]
    async fn generate_handles_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client_for(&server).generate(request()).await.unwrap_err();
        assert!(matches!(error, GenerationError::Unavailable(message) if message.contains("500")));
    }

    #[tokio::test]
    async fn generate_rejects_incomplete_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "partial",
                    "done": false
                }));
            })
            .await;

        let error = client_for(&server).generate(request()).await.unwrap_err();
        assert!(matches!(error, GenerationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn probe_reports_model_presence() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/show");
                then.status(200).json_body(json!({ "license": "" }));
            })
            .await;

        let snapshot = client_for(&server).probe("llama").await;
        assert!(snapshot.reachable);
        assert!(snapshot.model_available);
    }

    #[tokio::test]
    async fn probe_reports_missing_model() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/show");
                then.status(404).body("model not found");
            })
            .await;

        let snapshot = client_for(&server).probe("absent").await;
        assert!(snapshot.reachable);
        assert!(!snapshot.model_available);
    }
}
