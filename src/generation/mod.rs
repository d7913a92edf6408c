//! Client abstraction for the hosted text-generation API.
//!
//! Answers are produced by Cohere's `generate` endpoint. The adapter speaks plain HTTP through
//! `reqwest`, which keeps the request body explicit and lets tests point it at a mock server.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced while requesting a generation.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// Provider could not be reached.
    #[error("Generation provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate text: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to the generation provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Fully assembled prompt.
    pub prompt: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Generation halts at the first of these sequences.
    pub stop_sequences: Vec<String>,
}

/// Interface implemented by text-generation providers.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate candidate completions for the request, in provider order.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Vec<String>, GenerationClientError>;
}

/// Build the Cohere-backed client described by `config`.
pub fn get_generation_client(config: &Config) -> Box<dyn GenerationClient> {
    Box::new(CohereGenerationClient::new(
        config.cohere_base_url.clone(),
        config.cohere_api_key.clone(),
    ))
}

/// Adapter for Cohere's `POST /v1/generate`.
pub struct CohereGenerationClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CohereGenerationClient {
    /// Create a client for the given API base URL and key.
    pub fn new(base_url: String, api_key: String) -> Self {
        let http = Client::builder()
            .user_agent(concat!("pdfqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct CohereResponse {
    #[serde(default)]
    generations: Vec<CohereGeneration>,
}

#[derive(Debug, Deserialize)]
struct CohereGeneration {
    text: String,
}

#[async_trait]
impl GenerationClient for CohereGenerationClient {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Vec<String>, GenerationClientError> {
        tracing::debug!(
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            max_tokens = request.max_tokens,
            "Requesting generation"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                GenerationClientError::ProviderUnavailable(format!(
                    "failed to reach Cohere at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GenerationClientError::ProviderUnavailable(format!(
                "Cohere endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::GenerationFailed(format!(
                "Cohere returned {status}: {body}"
            )));
        }

        let body: CohereResponse = response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!(
                "failed to decode Cohere response: {error}"
            ))
        })?;

        if body.generations.is_empty() {
            return Err(GenerationClientError::InvalidResponse(
                "Cohere response contained no generations".into(),
            ));
        }

        Ok(body
            .generations
            .into_iter()
            .map(|generation| generation.text)
            .collect())
    }
}
