use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// Embedder backed by a local Ollama instance (`/api/embed`).
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.url)
    }

    fn request<'a>(&'a self, texts: &'a [&'a str]) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.model,
            input: texts,
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// One vector per input or an error; Ollama returns them in input order.
fn decode(response: EmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if response.embeddings.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: response.embeddings.len(),
        });
    }
    Ok(response.embeddings)
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(model = %self.model, batch = texts.len(), "Ollama embed request");

        let response = self
            .client
            .post(self.endpoint())
            .json(&self.request(texts))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        decode(response.json().await?, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
