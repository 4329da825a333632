use fraud_curator::{CuratorError, DetectionOptions};

use crate::helpers::{harness, options, StubReasoner};

#[tokio::test]
async fn empty_input_is_invalid() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));
    let err = h.curator.run_fraud_detection("", &options()).await.unwrap_err();

    assert!(matches!(err, CuratorError::InvalidInput { length: 0, .. }));
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.reasoner.analyze_calls(), 0);
}

#[tokio::test]
async fn short_and_long_inputs_call_nothing_downstream() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));
    let opts = DetectionOptions {
        min_length: 10,
        max_length: 40,
        ..options()
    };

    let long = "a".repeat(41);
    for text in ["corto", "   padded   ", long.as_str()] {
        let err = h.curator.run_fraud_detection(text, &opts).await.unwrap_err();
        assert!(
            matches!(err, CuratorError::InvalidInput { min: 10, max: 40, .. }),
            "{text:?} should be rejected, got {err}"
        );
    }

    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.reasoner.analyze_calls(), 0);
    assert_eq!(h.reasoner.classify_calls(), 0);
}

#[tokio::test]
async fn bounds_are_inclusive() {
    let h = harness(StubReasoner::clean());
    let opts = DetectionOptions {
        min_length: 10,
        max_length: 10,
        ..options()
    };
    let verdict = h.curator.run_fraud_detection("0123456789", &opts).await.unwrap();
    assert!(!verdict.is_fraud);
}

#[tokio::test]
async fn length_is_measured_after_cleaning() {
    let h = harness(StubReasoner::clean());
    let opts = DetectionOptions {
        min_length: 1,
        max_length: 12,
        ..options()
    };
    // 26 raw chars, 12 once whitespace collapses.
    let verdict = h
        .curator
        .run_fraud_detection("   hola      que   tal    ", &opts)
        .await
        .unwrap();
    assert!(!verdict.is_fraud);
}
