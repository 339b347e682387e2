//! Embedding providers used for role similarity.
//!
//! `HashingEmbeddingProvider` is deterministic and needs nothing but the text;
//! `HttpEmbeddingProvider` asks an OpenAI-compatible `/v1/embeddings` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::AnalysisError;
use crate::config::LlmEndpointConfig;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns an empty vector for empty text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AnalysisError>;
}

/// Maps the SHA-256 digest of the text to 32 components in [0, 1].
pub struct HashingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AnalysisError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let digest = Sha256::digest(text.as_bytes());
        Ok(digest.iter().map(|b| f32::from(*b) / 255.0).collect())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingProvider {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: &LlmEndpointConfig, model: impl Into<String>) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Embedding(e.to_string()))?;
        Ok(Self {
            client,
            url: format!("{}/v1/embeddings", endpoint.base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: endpoint.api_key.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AnalysisError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AnalysisError::Embedding(e.to_string()))?;

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Embedding(e.to_string()))?;

        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AnalysisError::Embedding("embedding response had no data".to_string()))?;

        debug!("Embedded {} chars into {} dimensions", text.len(), vector.len());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_hashing_is_deterministic_and_bounded() {
        let provider = HashingEmbeddingProvider;
        let a = provider.embed("Build data pipelines").await.unwrap();
        let b = provider.embed("Build data pipelines").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn test_hashing_empty_text_is_empty_vector() {
        assert!(HashingEmbeddingProvider.embed("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_http_provider_reads_first_embedding() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "bge");
                Json(json!({"data": [{"embedding": [0.1, 0.2, 0.3]}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let endpoint = LlmEndpointConfig {
            base_url: format!("http://{addr}/"),
            completion_path: "/api/v1/completions".to_string(),
            api_key: None,
            model: None,
            timeout_secs: 5,
        };
        let provider = HttpEmbeddingProvider::new(&endpoint, "bge").unwrap();
        assert_eq!(provider.embed("text").await.unwrap(), vec![0.1, 0.2, 0.3]);
    }
}
