use std::sync::{Arc, Mutex};

use tracing::debug;

use super::cache::EmbeddingCache;
use super::traits::{Embedder, EmbeddingError};

/// Turns normalized case text into a fixed-size vector.
///
/// Any backend failure or malformed output is an error; the encoder never
/// substitutes a default vector.
pub struct CaseEncoder {
    embedder: Arc<dyn Embedder>,
    cache: Option<Mutex<EmbeddingCache>>,
}

impl CaseEncoder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            cache: None,
        }
    }

    /// Enable an LRU cache of `capacity` entries. A capacity of 0 leaves
    /// caching off.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = (capacity > 0).then(|| Mutex::new(EmbeddingCache::new(capacity)));
        self
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    pub async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(hit) = self.cached(text) {
            return Ok(hit);
        }

        let mut vectors = self.embedder.embed_batch(&[text]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }
        let vector = vectors.remove(0);

        let expected = self.embedder.dimensions();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::NonFinite);
        }

        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.put(text, vector.clone());
                debug!(entries = cache.len(), hit_rate = cache.hit_rate(), "embedding cached");
            }
        }
        Ok(vector)
    }

    fn cached(&self, text: &str) -> Option<Vec<f32>> {
        let mut cache = self.cache.as_ref()?.lock().ok()?;
        let hit = cache.get(text)?;
        debug!(hit_rate = cache.hit_rate(), "embedding cache hit");
        Some(hit)
    }
}
