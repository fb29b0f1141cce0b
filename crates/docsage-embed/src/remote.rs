//! Remote embedder against an OpenAI-compatible embeddings endpoint.

use async_trait::async_trait;
use ndarray::Array1;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::Embedder;
use docsage_core::{Error, Result};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

/// Embedder calling a remote OpenAI-compatible `/v1/embeddings` endpoint.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dim: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(api_key: String, model: String, dim: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            model,
            dim,
        }
    }

    /// Point at a non-default endpoint (self-hosted gateways).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        // The endpoint rejects empty input
        let input = if text.is_empty() { " " } else { text };

        let body = json!({
            "model": self.model,
            "input": [input],
        });

        debug!("Embedding query via {} (model={})", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "embedding API error {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("embedding response malformed: {}", e)))?;

        let row = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::Upstream("embedding response empty".into()))?;

        if row.embedding.len() != self.dim {
            return Err(Error::Upstream(format!(
                "embedding dimension {} does not match configured {}",
                row.embedding.len(),
                self.dim
            )));
        }

        Ok(Array1::from_vec(row.embedding))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        true
    }
}
