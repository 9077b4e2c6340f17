//! Remote embedding backend — calls an HTTP embedding inference service
//!
//! Deployments that cannot ship the ONNX weights alongside the binary point
//! `[models] embedding_backend = "remote"` at a sidecar exposing
//! `POST /embed {"text": ...} -> {"embedding": [...]}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use super::{EmbeddingBackend, ScoringError};

/// Remote embedding client configuration
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingConfig {
    pub base_url: String,
    pub dimensions: usize,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorResponse {
    error: Option<ServiceErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    code: u16,
    message: String,
}

/// HTTP embedding client with exponential-backoff retry on transport errors.
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingClient {
    client: Client,
    config: RemoteEmbeddingConfig,
}

impl RemoteEmbeddingClient {
    pub fn new(config: RemoteEmbeddingConfig) -> Result<Self, ScoringError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let result = Retry::spawn(retry_strategy, || self.embed_once(text)).await;

        match result {
            Ok(vec) => Ok(vec),
            Err(e) => {
                tracing::error!(
                    attempts = self.config.max_retries,
                    error = %e,
                    "All embedding retry attempts failed"
                );
                Err(ScoringError::RetryExhausted {
                    attempts: self.config.max_retries,
                })
            }
        }
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        let url = format!("{}/embed", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { text })
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<ServiceErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Embedding service error");

            return Err(ScoringError::Api { code, message });
        }

        let embed_response: EmbedResponse = response.json().await?;
        let values = embed_response.embedding;

        if values.is_empty() {
            return Err(ScoringError::MissingEmbedding);
        }
        if values.len() != self.config.dimensions {
            return Err(ScoringError::InvalidDimensions {
                expected: self.config.dimensions,
                actual: values.len(),
            });
        }

        Ok(values)
    }
}

#[async_trait]
impl EmbeddingBackend for RemoteEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        self.embed_with_retry(text).await
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "remote"
    }
}

// ============================================================================
// TESTS
// ============================================================================
