use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CaseId = Uuid;

/// A historical or current fraud report with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub text: String,
    pub embedding: Vec<f32>,
    pub fraud_type: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Case {
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            embedding,
            fraud_type: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_fraud_type(mut self, fraud_type: impl Into<String>) -> Self {
        self.fraud_type = Some(fraud_type.into());
        self
    }
}

/// A known fraud category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudTypeEntry {
    pub name: String,
    pub description: String,
    pub registered_at: DateTime<Utc>,
}

/// Fraud / not-fraud judgment with supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub is_fraud: bool,
    #[serde(default)]
    pub patterns: Vec<String>,
    pub reasoning: String,
}

/// Outcome of pattern analysis, split so downstream stages dispatch on it
/// instead of re-reading the flag.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    Fraud(PatternAnalysis),
    Clean(PatternAnalysis),
}

impl PatternAnalysis {
    pub fn into_branch(self) -> Branch {
        if self.is_fraud {
            Branch::Fraud(self)
        } else {
            Branch::Clean(self)
        }
    }
}

/// Mapping of a confirmed fraud case onto the type taxonomy.
///
/// `fraud_type` is always set; `new_type_name` only when the label is
/// discovered for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeClassification {
    pub fraud_type: String,
    pub explanation: String,
    #[serde(default)]
    pub new_type_name: Option<String>,
}

/// Human-readable synthesis of a fraud case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudSummary {
    pub summary: String,
    #[serde(default)]
    pub warning_signs: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
}

/// Workflow stage reached by an [`AnalysisState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Validated,
    Analyzed,
    FraudBranch,
    CleanBranch,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Start => "start",
            Stage::Validated => "validated",
            Stage::Analyzed => "analyzed",
            Stage::FraudBranch => "fraud_branch",
            Stage::CleanBranch => "clean_branch",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Mutable record threaded through one detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisState {
    pub stage: Stage,
    pub text: String,
    /// Most similar first.
    pub similar_cases: Vec<String>,
    pub pattern_analysis: Option<PatternAnalysis>,
    pub fraud_type: Option<TypeClassification>,
    pub final_summary: Option<FraudSummary>,
    pub is_fraud: bool,
    pub new_type_name: Option<String>,
}

impl AnalysisState {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            stage: Stage::Start,
            text: text.into(),
            similar_cases: Vec::new(),
            pattern_analysis: None,
            fraud_type: None,
            final_summary: None,
            is_fraud: false,
            new_type_name: None,
        }
    }

    /// Type classification and new-type name only exist on the fraud path.
    pub fn is_consistent(&self) -> bool {
        if self.is_fraud {
            self.fraud_type.is_some()
        } else {
            self.fraud_type.is_none() && self.new_type_name.is_none() && self.final_summary.is_none()
        }
    }
}

/// Final structured fraud determination returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_fraud: bool,
    pub fraud_type: Option<String>,
    pub explanation: String,
    pub should_alert: bool,
    pub new_type_name: Option<String>,
    pub similar_cases_count: usize,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub summary: Option<FraudSummary>,
    pub analyzed_at: DateTime<Utc>,
}

impl Verdict {
    /// Derive the verdict from a finished state. Returns `None` while the
    /// state has no pattern analysis yet.
    pub fn from_state(state: &AnalysisState) -> Option<Self> {
        let analysis = state.pattern_analysis.as_ref()?;
        let (fraud_type, explanation) = match (&state.fraud_type, state.is_fraud) {
            (Some(classification), true) => (
                Some(classification.fraud_type.clone()),
                classification.explanation.clone(),
            ),
            _ => (None, analysis.reasoning.clone()),
        };

        Some(Self {
            is_fraud: state.is_fraud,
            fraud_type,
            explanation,
            should_alert: state.is_fraud,
            new_type_name: state.new_type_name.clone().filter(|_| state.is_fraud),
            similar_cases_count: state.similar_cases.len(),
            patterns: analysis.patterns.clone(),
            summary: state.final_summary.clone().filter(|_| state.is_fraud),
            analyzed_at: Utc::now(),
        })
    }
}
