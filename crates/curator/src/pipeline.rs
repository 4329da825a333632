use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use curator_core::config::Config;
use curator_core::{
    AnalysisState, Branch, Case, CuratorError, PatternAnalysis, Stage, TypeClassification,
    Verdict,
};
use curator_embedding::{CaseEncoder, CaseIndex, InMemoryCaseIndex, SimilarityMetric};
use curator_llm::{LlmReasoningEngine, ReasoningEngine};

use crate::options::DetectionOptions;
use crate::registry::{canonical_name, FraudTypeRegistry};

/// Await `fut` for at most `timeout`; both failure and expiry map through `kind`.
async fn bounded<T, E, F>(
    timeout: Duration,
    what: &str,
    kind: fn(String) -> CuratorError,
    fut: F,
) -> Result<T, CuratorError>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(kind(format!("{what}: {e}"))),
        Err(_) => Err(kind(format!("{what} timed out after {timeout:?}"))),
    }
}

/// Runs the fraud detection workflow over shared collaborators.
///
/// One instance serves any number of concurrent requests; the fraud type
/// registry is the only state a run can mutate (plus the index when
/// `remember_cases` is on).
pub struct FraudCurator {
    encoder: CaseEncoder,
    index: Arc<dyn CaseIndex>,
    reasoner: Arc<dyn ReasoningEngine>,
    registry: Arc<FraudTypeRegistry>,
}

impl FraudCurator {
    pub fn new(
        encoder: CaseEncoder,
        index: Arc<dyn CaseIndex>,
        reasoner: Arc<dyn ReasoningEngine>,
        registry: Arc<FraudTypeRegistry>,
    ) -> Self {
        Self {
            encoder,
            index,
            reasoner,
            registry,
        }
    }

    /// Wire every collaborator from config: configured embedder with cache,
    /// in-memory index scored with `SIMILARITY_METRIC`, LLM reasoner, and a
    /// registry loaded from `FRAUD_TYPES_PATH` when set.
    pub fn from_config(config: &Config) -> Result<Self, CuratorError> {
        let encoder =
            curator_embedding::create_encoder(&config.embedding, &config.llm, &config.ollama)
                .map_err(|e| CuratorError::Config(e.to_string()))?;
        let metric: SimilarityMetric = config
            .detection
            .similarity_metric
            .parse()
            .map_err(CuratorError::Config)?;
        let index =
            InMemoryCaseIndex::new(metric).with_min_similarity(config.detection.min_similarity);
        let reasoner = LlmReasoningEngine::from_config(&config.llm, &config.ollama)
            .map_err(|e| CuratorError::Config(e.to_string()))?;

        let threshold = config.detection.fuzzy_match_threshold;
        let registry = match &config.detection.fraud_types_path {
            Some(path) => FraudTypeRegistry::load_or_default(path, threshold)?,
            None => FraudTypeRegistry::with_defaults(threshold),
        };

        Ok(Self::new(
            encoder,
            Arc::new(index),
            Arc::new(reasoner),
            Arc::new(registry),
        ))
    }

    pub fn registry(&self) -> &Arc<FraudTypeRegistry> {
        &self.registry
    }

    pub fn index(&self) -> &Arc<dyn CaseIndex> {
        &self.index
    }

    /// Clean, encode and store a historical case so later runs can retrieve it.
    pub async fn add_case(
        &self,
        text: &str,
        fraud_type: Option<&str>,
        timeout: Duration,
    ) -> Result<(), CuratorError> {
        let text = curator_core::text::clean(text);
        let embedding = self.encode(&text, timeout).await?;
        let mut case = Case::new(text, embedding);
        case.fraud_type = fraud_type
            .map(|t| self.registry.match_name(t).unwrap_or_else(|| t.to_string()));
        self.index
            .add(case)
            .await
            .map_err(|e| CuratorError::IndexUnavailable(e.to_string()))
    }

    /// Take `text` through validation, retrieval, pattern analysis and,
    /// on the fraud branch, type classification and summary.
    pub async fn run_fraud_detection(
        &self,
        text: &str,
        options: &DetectionOptions,
    ) -> Result<Verdict, CuratorError> {
        let started = Instant::now();
        let result = self.run(text, options).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(verdict) => info!(
                is_fraud = verdict.is_fraud,
                fraud_type = verdict.fraud_type.as_deref().unwrap_or("-"),
                similar_cases = verdict.similar_cases_count,
                elapsed_ms,
                "fraud detection complete"
            ),
            Err(e) => warn!(kind = e.kind(), error = %e, elapsed_ms, "fraud detection aborted"),
        }
        result
    }

    async fn run(&self, raw: &str, options: &DetectionOptions) -> Result<Verdict, CuratorError> {
        // Start → Validated
        let text = options.gate().admit(raw)?;
        let mut state = AnalysisState::new(text);
        state.stage = Stage::Validated;
        debug!(stage = %state.stage, chars = state.text.chars().count(), "input accepted");

        // Validated → Analyzed
        let embedding = self.encode(&state.text, options.timeout).await?;
        let similar = self
            .index
            .query(&embedding, options.k)
            .await
            .map_err(|e| CuratorError::IndexUnavailable(e.to_string()))?;
        state.similar_cases = similar.into_iter().map(|c| c.text).collect();

        let analysis = bounded(
            options.timeout,
            "pattern analysis",
            CuratorError::ReasoningUnavailable,
            self.reasoner.analyze_pattern(&state.text, &state.similar_cases),
        )
        .await?;
        state.is_fraud = analysis.is_fraud;
        state.pattern_analysis = Some(analysis.clone());
        state.stage = Stage::Analyzed;
        debug!(
            stage = %state.stage,
            is_fraud = state.is_fraud,
            similar_cases = state.similar_cases.len(),
            "pattern analysis done"
        );

        let unregistered = match analysis.into_branch() {
            Branch::Fraud(analysis) => self.fraud_branch(&mut state, &analysis, options).await?,
            Branch::Clean(_) => {
                state.stage = Stage::CleanBranch;
                debug!(stage = %state.stage, "no fraud, skipping classification");
                false
            }
        };

        if options.remember_cases && state.is_fraud {
            let mut case = Case::new(state.text.clone(), embedding);
            case.fraud_type = state.fraud_type.as_ref().map(|c| c.fraud_type.clone());
            self.index
                .add(case)
                .await
                .map_err(|e| CuratorError::IndexUnavailable(e.to_string()))?;
        }

        // The registry is only written once every collaborator call succeeded.
        if unregistered {
            self.commit_type(&mut state)?;
        }

        state.stage = Stage::Done;
        debug_assert!(state.is_consistent());
        Verdict::from_state(&state).ok_or_else(|| {
            CuratorError::ReasoningUnavailable("pattern analysis missing at verdict".into())
        })
    }

    /// Classify and optionally summarize. Returns `true` when the chosen
    /// type is not in the registry yet and still has to be committed.
    async fn fraud_branch(
        &self,
        state: &mut AnalysisState,
        analysis: &PatternAnalysis,
        options: &DetectionOptions,
    ) -> Result<bool, CuratorError> {
        state.stage = Stage::FraudBranch;
        let known_types = self.registry.known_names();

        let proposed = bounded(
            options.timeout,
            "type classification",
            CuratorError::ReasoningUnavailable,
            self.reasoner.classify_type(&state.text, analysis, &known_types),
        )
        .await?;
        let (classification, unregistered) = self.provisional_type(proposed)?;
        debug!(
            stage = %state.stage,
            fraud_type = %classification.fraud_type,
            new_type = unregistered,
            "type classified"
        );

        if options.summarize {
            let summary = bounded(
                options.timeout,
                "summary",
                CuratorError::ReasoningUnavailable,
                self.reasoner.summarize(analysis, &classification),
            )
            .await?;
            state.final_summary = Some(summary);
        }

        state.new_type_name = classification.new_type_name.clone();
        state.fraud_type = Some(classification);
        Ok(unregistered)
    }

    /// Reconcile the reasoner's answer with the registry without writing to
    /// it. A proposed name wins over the label, and a label the registry does
    /// not know counts as a proposal.
    fn provisional_type(
        &self,
        proposed: TypeClassification,
    ) -> Result<(TypeClassification, bool), CuratorError> {
        let TypeClassification {
            fraud_type,
            explanation,
            new_type_name,
        } = proposed;
        let candidate = new_type_name.unwrap_or(fraud_type);

        if let Some(known) = self.registry.match_name(&candidate) {
            let classification = TypeClassification {
                fraud_type: known,
                explanation,
                new_type_name: None,
            };
            return Ok((classification, false));
        }

        let name = canonical_name(&candidate);
        if name.is_empty() {
            return Err(CuratorError::RegistryConflict(format!(
                "fraud type name '{candidate}' has no usable characters"
            )));
        }
        let classification = TypeClassification {
            fraud_type: name.clone(),
            explanation,
            new_type_name: Some(name),
        };
        Ok((classification, true))
    }

    /// Register the run's provisional type. If another request registered it
    /// first, the run reports the existing type and no new name.
    fn commit_type(&self, state: &mut AnalysisState) -> Result<(), CuratorError> {
        let Some(classification) = state.fraud_type.as_mut() else {
            return Ok(());
        };
        let registration = self
            .registry
            .register(&classification.fraud_type, &classification.explanation)?;
        let entry = registration.entry();
        if !registration.is_new() {
            debug!(fraud_type = %entry.name, "fraud type registered by a concurrent run");
        }

        classification.fraud_type = entry.name.clone();
        classification.new_type_name = registration.is_new().then(|| entry.name.clone());
        state.new_type_name = classification.new_type_name.clone();
        Ok(())
    }

    async fn encode(&self, text: &str, timeout: Duration) -> Result<Vec<f32>, CuratorError> {
        bounded(
            timeout,
            "encoding",
            CuratorError::EncodingUnavailable,
            self.encoder.encode(text),
        )
        .await
    }
}
