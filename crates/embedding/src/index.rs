use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use curator_core::Case;

/// Default number of neighbours returned by a similarity query.
pub const DEFAULT_K: usize = 3;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index lock poisoned")]
    Poisoned,

    #[error("index backend error: {0}")]
    Backend(String),
}

/// Score function used to rank stored cases against a query vector.
/// Higher is always more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    DotProduct,
    /// `1 / (1 + euclidean distance)`.
    Euclidean,
}

impl SimilarityMetric {
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SimilarityMetric::Cosine => {
                let dot = dot(a, b);
                let norms = dot_self(a).sqrt() * dot_self(b).sqrt();
                if norms == 0.0 {
                    0.0
                } else {
                    dot / norms
                }
            }
            SimilarityMetric::DotProduct => dot(a, b),
            SimilarityMetric::Euclidean => {
                let dist = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt();
                1.0 / (1.0 + dist)
            }
        }
    }
}

impl std::str::FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "dot" | "dot_product" => Ok(SimilarityMetric::DotProduct),
            "euclidean" | "l2" => Ok(SimilarityMetric::Euclidean),
            other => Err(format!("unknown similarity metric: '{other}'")),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn dot_self(a: &[f32]) -> f32 {
    dot(a, a)
}

/// One neighbour returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarCase {
    pub text: String,
    pub score: f32,
    pub fraud_type: Option<String>,
}

/// Nearest-neighbour store over historical case embeddings.
#[async_trait]
pub trait CaseIndex: Send + Sync {
    /// Up to `k` cases, most similar first. Equal scores keep insertion
    /// order. An empty index yields an empty result.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SimilarCase>, IndexError>;

    /// Store a case for future retrieval. Visible to every query issued
    /// after this returns.
    async fn add(&self, case: Case) -> Result<(), IndexError>;

    async fn len(&self) -> Result<usize, IndexError>;
}

/// Brute-force index held in memory behind a reader/writer lock.
pub struct InMemoryCaseIndex {
    cases: RwLock<Vec<Case>>,
    metric: SimilarityMetric,
    min_similarity: Option<f32>,
}

impl Default for InMemoryCaseIndex {
    fn default() -> Self {
        Self::new(SimilarityMetric::default())
    }
}

impl InMemoryCaseIndex {
    pub fn new(metric: SimilarityMetric) -> Self {
        Self {
            cases: RwLock::new(Vec::new()),
            metric,
            min_similarity: None,
        }
    }

    /// Drop neighbours scoring below `threshold`.
    pub fn with_min_similarity(mut self, threshold: Option<f32>) -> Self {
        self.min_similarity = threshold;
        self
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    fn rank(&self, cases: &[Case], embedding: &[f32], k: usize) -> Vec<SimilarCase> {
        let mut scored: Vec<(f32, &Case)> = cases
            .iter()
            .map(|case| (self.metric.score(embedding, &case.embedding), case))
            .filter(|(score, _)| !score.is_nan())
            .filter(|(score, _)| self.min_similarity.map_or(true, |min| *score >= min))
            .collect();

        // `sort_by` is stable, so ties stay in insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, case)| SimilarCase {
                text: case.text.clone(),
                score,
                fraud_type: case.fraud_type.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl CaseIndex for InMemoryCaseIndex {
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SimilarCase>, IndexError> {
        let cases = self.cases.read().map_err(|_| IndexError::Poisoned)?;
        if let Some(first) = cases.first() {
            if first.embedding.len() != embedding.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: first.embedding.len(),
                    actual: embedding.len(),
                });
            }
        }
        let results = self.rank(&cases, embedding, k);
        debug!(stored = cases.len(), returned = results.len(), k, "similarity query");
        Ok(results)
    }

    async fn add(&self, case: Case) -> Result<(), IndexError> {
        let mut cases = self.cases.write().map_err(|_| IndexError::Poisoned)?;
        if let Some(first) = cases.first() {
            if first.embedding.len() != case.embedding.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: first.embedding.len(),
                    actual: case.embedding.len(),
                });
            }
        }
        cases.push(case);
        Ok(())
    }

    async fn len(&self) -> Result<usize, IndexError> {
        Ok(self.cases.read().map_err(|_| IndexError::Poisoned)?.len())
    }
}
