pub mod cache;
pub mod encoder;
pub mod hashing;
pub mod index;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use curator_core::config::{EmbeddingConfig, LlmConfig, OllamaConfig};

pub use cache::EmbeddingCache;
pub use encoder::CaseEncoder;
pub use hashing::HashingEmbedder;
pub use index::{CaseIndex, InMemoryCaseIndex, IndexError, SimilarCase, SimilarityMetric};
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};

/// Create the embedding backend selected by config.
///
/// The OpenAI backend reuses the LLM section's key and base URL.
pub fn create_embedder(
    embedding: &EmbeddingConfig,
    llm: &LlmConfig,
    ollama: &OllamaConfig,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let dimensions = embedding.dimensions as usize;
    match embedding.provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbedder::new(dimensions))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            ollama.url.clone(),
            ollama.embedding_model.clone(),
            dimensions,
        ))),
        "openai" => {
            let api_key = llm
                .openai_api_key
                .as_ref()
                .ok_or_else(|| EmbeddingError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key.clone(),
                embedding.model.clone(),
                llm.openai_base_url.clone(),
                dimensions,
            )))
        }
        other => Err(EmbeddingError::NotConfigured(format!(
            "unknown embedding provider: '{}'",
            other
        ))),
    }
}

/// Build a [`CaseEncoder`] for the configured backend, with caching applied.
pub fn create_encoder(
    embedding: &EmbeddingConfig,
    llm: &LlmConfig,
    ollama: &OllamaConfig,
) -> Result<CaseEncoder, EmbeddingError> {
    let embedder = create_embedder(embedding, llm, ollama)?;
    Ok(CaseEncoder::new(embedder).with_cache(embedding.cache_size as usize))
}
