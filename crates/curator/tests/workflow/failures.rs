use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use curator_core::{Case, CuratorError};
use curator_embedding::{CaseEncoder, CaseIndex, InMemoryCaseIndex, IndexError, SimilarCase};
use fraud_curator::{FraudCurator, FraudTypeRegistry};

use crate::helpers::{
    harness, harness_with, options, CountingEmbedder, Step, StubReasoner, BBVA_REPORT,
};

struct BrokenIndex;

#[async_trait]
impl CaseIndex for BrokenIndex {
    async fn query(&self, _embedding: &[f32], _k: usize) -> Result<Vec<SimilarCase>, IndexError> {
        Err(IndexError::Backend("store offline".into()))
    }

    async fn add(&self, _case: Case) -> Result<(), IndexError> {
        Err(IndexError::Backend("store offline".into()))
    }

    async fn len(&self) -> Result<usize, IndexError> {
        Err(IndexError::Backend("store offline".into()))
    }
}

/// Answers queries but refuses writes.
#[derive(Default)]
struct ReadOnlyIndex {
    inner: InMemoryCaseIndex,
}

#[async_trait]
impl CaseIndex for ReadOnlyIndex {
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SimilarCase>, IndexError> {
        self.inner.query(embedding, k).await
    }

    async fn add(&self, _case: Case) -> Result<(), IndexError> {
        Err(IndexError::Backend("read-only replica".into()))
    }

    async fn len(&self) -> Result<usize, IndexError> {
        self.inner.len().await
    }
}

fn curator_over(index: Arc<dyn CaseIndex>, reasoner: Arc<StubReasoner>) -> FraudCurator {
    FraudCurator::new(
        CaseEncoder::new(Arc::new(CountingEmbedder::new(false))),
        index,
        reasoner,
        Arc::new(FraudTypeRegistry::with_defaults(0.85)),
    )
}

#[tokio::test]
async fn reasoner_error_aborts_run() {
    let h = harness(StubReasoner::failing());
    let err = h
        .curator
        .run_fraud_detection(BBVA_REPORT, &options())
        .await
        .unwrap_err();

    assert!(matches!(err, CuratorError::ReasoningUnavailable(_)), "{err:?}");
    assert_eq!(err.kind(), "reasoning_unavailable");
    assert_eq!(h.reasoner.classify_calls(), 0);
}

#[tokio::test]
async fn slow_reasoner_times_out() {
    let h = harness(StubReasoner::slow(Duration::from_millis(500)));
    let opts = options().with_timeout(Duration::from_millis(50));

    let err = h
        .curator
        .run_fraud_detection(BBVA_REPORT, &opts)
        .await
        .unwrap_err();

    match err {
        CuratorError::ReasoningUnavailable(msg) => assert!(msg.contains("timed out"), "{msg}"),
        other => panic!("expected ReasoningUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn encoder_down_stops_before_reasoning() {
    let h = harness_with(StubReasoner::fraud("IMPERSONATION"), CountingEmbedder::new(true));
    let err = h
        .curator
        .run_fraud_detection(BBVA_REPORT, &options())
        .await
        .unwrap_err();

    assert!(matches!(err, CuratorError::EncodingUnavailable(_)), "{err:?}");
    assert_eq!(h.embedder.calls(), 1);
    assert_eq!(h.reasoner.analyze_calls(), 0);
}

#[tokio::test]
async fn failed_add_case_reports_encoding() {
    let h = harness_with(StubReasoner::clean(), CountingEmbedder::new(true));
    let err = h
        .curator
        .add_case("Caso historico de suplantacion.", None, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, CuratorError::EncodingUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn index_failure_is_reported() {
    let reasoner = Arc::new(StubReasoner::fraud("IMPERSONATION"));
    let curator = curator_over(Arc::new(BrokenIndex), reasoner.clone());

    let err = curator
        .run_fraud_detection(BBVA_REPORT, &options())
        .await
        .unwrap_err();

    assert!(matches!(err, CuratorError::IndexUnavailable(_)), "{err:?}");
    assert_eq!(reasoner.analyze_calls(), 0);
}

#[tokio::test]
async fn failed_run_leaves_registry_untouched() {
    let h = harness(StubReasoner::proposing("SIM_SWAP").failing_at(Step::Analyze, 1));
    let before = h.curator.registry().len();

    assert!(h.curator.run_fraud_detection(BBVA_REPORT, &options()).await.is_err());
    assert_eq!(h.curator.registry().len(), before);
}

#[tokio::test]
async fn classification_error_aborts_run() {
    let h = harness(StubReasoner::proposing("SIM_SWAP").failing_at(Step::Classify, 1));
    let before = h.curator.registry().len();

    let err = h
        .curator
        .run_fraud_detection(BBVA_REPORT, &options())
        .await
        .unwrap_err();

    assert!(matches!(err, CuratorError::ReasoningUnavailable(_)), "{err:?}");
    assert_eq!(h.reasoner.summarize_calls(), 0);
    assert_eq!(h.curator.registry().len(), before);
}

#[tokio::test]
async fn slow_classification_times_out() {
    let h = harness(
        StubReasoner::fraud("IMPERSONATION").slow_at(Step::Classify, Duration::from_millis(500)),
    );
    let opts = options().with_timeout(Duration::from_millis(50));

    let err = h
        .curator
        .run_fraud_detection(BBVA_REPORT, &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, CuratorError::ReasoningUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn summary_error_keeps_new_type_for_retry() {
    let h = harness(StubReasoner::proposing("SIM_SWAP").failing_at(Step::Summarize, 1));
    let before = h.curator.registry().len();
    let report = "Mi linea dejo de funcionar y luego vaciaron mi cuenta.";

    let err = h
        .curator
        .run_fraud_detection(report, &options())
        .await
        .unwrap_err();
    assert!(matches!(err, CuratorError::ReasoningUnavailable(_)), "{err:?}");
    assert_eq!(h.curator.registry().len(), before);
    assert_eq!(h.curator.registry().match_name("SIM_SWAP"), None);

    let retry = h.curator.run_fraud_detection(report, &options()).await.unwrap();
    assert_eq!(retry.fraud_type.as_deref(), Some("SIM_SWAP"));
    assert_eq!(retry.new_type_name.as_deref(), Some("SIM_SWAP"));
    assert_eq!(h.curator.registry().len(), before + 1);
}

#[tokio::test]
async fn slow_summary_times_out() {
    let h = harness(
        StubReasoner::proposing("SIM_SWAP").slow_at(Step::Summarize, Duration::from_millis(500)),
    );
    let before = h.curator.registry().len();
    let opts = options().with_timeout(Duration::from_millis(50));

    let err = h
        .curator
        .run_fraud_detection(BBVA_REPORT, &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, CuratorError::ReasoningUnavailable(_)), "{err:?}");
    assert_eq!(h.curator.registry().len(), before);
}

#[tokio::test]
async fn failed_remember_add_aborts_run() {
    let reasoner = Arc::new(StubReasoner::proposing("SIM_SWAP"));
    let curator = curator_over(Arc::new(ReadOnlyIndex::default()), reasoner.clone());
    let before = curator.registry().len();

    let err = curator
        .run_fraud_detection(BBVA_REPORT, &options().remembering_cases(true))
        .await
        .unwrap_err();

    assert!(matches!(err, CuratorError::IndexUnavailable(_)), "{err:?}");
    assert_eq!(reasoner.summarize_calls(), 1);
    assert_eq!(curator.registry().len(), before);

    // Without remembering, the same curator succeeds and reports the type.
    let verdict = curator.run_fraud_detection(BBVA_REPORT, &options()).await.unwrap();
    assert_eq!(verdict.new_type_name.as_deref(), Some("SIM_SWAP"));
}
