use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use curator_core::{FraudSummary, PatternAnalysis, TypeClassification};

use crate::json::parse_reply;
use crate::prompts;
use crate::provider::{LlmError, LlmProvider, Message};

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("malformed reasoning reply: {reason}")]
    Malformed {
        reason: String,
        raw_response: String,
    },
}

/// Judgment oracle behind the detection workflow.
///
/// Implementations must return an error rather than guess: a failed call is
/// never reported as "not fraud".
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Fraud / not-fraud judgment. `similar_cases` may be empty.
    async fn analyze_pattern(
        &self,
        text: &str,
        similar_cases: &[String],
    ) -> Result<PatternAnalysis, ReasoningError>;

    /// Map a confirmed fraud case onto `known_types`, or propose a new type
    /// via `new_type_name`. `fraud_type` is always populated.
    async fn classify_type(
        &self,
        text: &str,
        pattern_analysis: &PatternAnalysis,
        known_types: &[String],
    ) -> Result<TypeClassification, ReasoningError>;

    /// Human-readable synthesis of a classified fraud case.
    async fn summarize(
        &self,
        pattern_analysis: &PatternAnalysis,
        classification: &TypeClassification,
    ) -> Result<FraudSummary, ReasoningError>;
}

/// Classifier reply before the "NEW" sentinel is resolved.
#[derive(Debug, Deserialize)]
struct RawClassification {
    fraud_type: String,
    explanation: String,
    #[serde(default)]
    new_type_name: Option<String>,
}

/// [`ReasoningEngine`] backed by a chat-completion [`LlmProvider`].
pub struct LlmReasoningEngine {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmReasoningEngine {
    pub fn new(provider: Box<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(
        llm_config: &curator_core::config::LlmConfig,
        ollama_config: &curator_core::config::OllamaConfig,
    ) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(llm_config, ollama_config)?;
        Ok(Self::new(provider, llm_config.temperature, llm_config.max_tokens))
    }

    async fn ask(&self, system: &str, user: String) -> Result<String, ReasoningError> {
        let messages = vec![Message::system(system), Message::user(user)];
        let response = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;
        debug!(provider = self.provider.name(), "LLM response: {}", response);
        Ok(response)
    }
}

fn malformed(reason: impl Into<String>, raw: &str) -> ReasoningError {
    ReasoningError::Malformed {
        reason: reason.into(),
        raw_response: raw.to_string(),
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Resolve the classifier's reply into the contract shape: `fraud_type`
/// always names the chosen type and `new_type_name` is only kept when the
/// chosen type is not already known.
fn resolve_classification(
    raw: RawClassification,
    known_types: &[String],
    response: &str,
) -> Result<TypeClassification, ReasoningError> {
    if blank(&raw.explanation) {
        return Err(malformed("empty explanation", response));
    }
    let proposed = raw
        .new_type_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let chosen = raw.fraud_type.trim();
    let is_known = |name: &str| known_types.iter().any(|k| k.eq_ignore_ascii_case(name));

    let (fraud_type, new_type_name) = if chosen.eq_ignore_ascii_case(prompts::NEW_TYPE_SENTINEL) {
        let name = proposed.ok_or_else(|| malformed("NEW type without new_type_name", response))?;
        (name.clone(), Some(name))
    } else if blank(chosen) {
        let name = proposed.ok_or_else(|| malformed("empty fraud_type", response))?;
        (name.clone(), Some(name))
    } else if is_known(chosen) {
        (chosen.to_string(), None)
    } else {
        // Unknown label: treat it as a proposal even if the model left
        // new_type_name out.
        let name = proposed.unwrap_or_else(|| chosen.to_string());
        (name.clone(), Some(name))
    };

    Ok(TypeClassification {
        fraud_type,
        explanation: raw.explanation,
        new_type_name,
    })
}

#[async_trait]
impl ReasoningEngine for LlmReasoningEngine {
    async fn analyze_pattern(
        &self,
        text: &str,
        similar_cases: &[String],
    ) -> Result<PatternAnalysis, ReasoningError> {
        info!(similar_cases = similar_cases.len(), "running pattern analysis");
        let response = self
            .ask(
                prompts::PATTERN_ANALYSIS_SYSTEM,
                prompts::pattern_analysis_user(text, similar_cases),
            )
            .await?;

        let analysis: PatternAnalysis =
            parse_reply(&response).map_err(|e| malformed(e.to_string(), &response))?;
        if blank(&analysis.reasoning) {
            return Err(malformed("empty reasoning", &response));
        }
        Ok(analysis)
    }

    async fn classify_type(
        &self,
        text: &str,
        pattern_analysis: &PatternAnalysis,
        known_types: &[String],
    ) -> Result<TypeClassification, ReasoningError> {
        info!(known_types = known_types.len(), "running type classification");
        let response = self
            .ask(
                prompts::TYPE_CLASSIFICATION_SYSTEM,
                prompts::type_classification_user(
                    text,
                    &pattern_analysis.patterns,
                    &pattern_analysis.reasoning,
                    known_types,
                ),
            )
            .await?;

        let raw: RawClassification =
            parse_reply(&response).map_err(|e| malformed(e.to_string(), &response))?;
        resolve_classification(raw, known_types, &response)
    }

    async fn summarize(
        &self,
        pattern_analysis: &PatternAnalysis,
        classification: &TypeClassification,
    ) -> Result<FraudSummary, ReasoningError> {
        let analysis = serde_json::json!({
            "pattern_analysis": pattern_analysis,
            "fraud_type": classification,
        });
        let analysis_json = serde_json::to_string_pretty(&analysis)
            .map_err(|e| malformed(e.to_string(), ""))?;

        let response = self
            .ask(prompts::SUMMARY_SYSTEM, prompts::summary_user(&analysis_json))
            .await?;

        let summary: FraudSummary =
            parse_reply(&response).map_err(|e| malformed(e.to_string(), &response))?;
        if blank(&summary.summary) {
            return Err(malformed("empty summary", &response));
        }
        Ok(summary)
    }
}
