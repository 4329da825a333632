use std::time::Duration;

use fraud_curator::run_fraud_detection;

use crate::helpers::{harness, options, StubReasoner, BBVA_HISTORY, BBVA_REPORT};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn bbva_report_is_impersonation() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));
    h.curator.add_case(BBVA_HISTORY, Some("impersonation"), TIMEOUT).await.unwrap();

    let verdict = run_fraud_detection(&h.curator, BBVA_REPORT, &options())
        .await
        .unwrap();

    assert!(verdict.is_fraud);
    assert_eq!(verdict.fraud_type.as_deref(), Some("IMPERSONATION"));
    assert!(verdict.should_alert);
    assert_eq!(verdict.new_type_name, None);
    assert_eq!(verdict.similar_cases_count, 1);
    assert!(!verdict.explanation.is_empty());
    assert_eq!(verdict.patterns.len(), 2);

    let seen = h.reasoner.seen_similar.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], vec![BBVA_HISTORY.to_string()]);
}

#[tokio::test]
async fn clean_branch_skips_classification() {
    let h = harness(StubReasoner::clean());
    let types_before = h.curator.registry().len();

    let verdict = h
        .curator
        .run_fraud_detection("El vendedor no me entrego el paquete a tiempo.", &options())
        .await
        .unwrap();

    assert!(!verdict.is_fraud);
    assert!(!verdict.should_alert);
    assert_eq!(verdict.fraud_type, None);
    assert_eq!(verdict.new_type_name, None);
    assert_eq!(verdict.summary, None);
    assert_eq!(verdict.explanation, "A delivery dispute with no deception involved.");
    assert_eq!(h.reasoner.classify_calls(), 0);
    assert_eq!(h.reasoner.summarize_calls(), 0);
    assert_eq!(h.curator.registry().len(), types_before);
}

#[tokio::test]
async fn empty_index_still_runs_analysis() {
    let h = harness(StubReasoner::fraud("PHISHING"));

    let verdict = h
        .curator
        .run_fraud_detection("Me llego un correo pidiendo mi clave del banco.", &options())
        .await
        .unwrap();

    assert_eq!(verdict.similar_cases_count, 0);
    assert_eq!(h.reasoner.analyze_calls(), 1);
    assert_eq!(h.reasoner.seen_similar.lock().unwrap()[0], Vec::<String>::new());
}

#[tokio::test]
async fn fraud_verdict_explains_with_type() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));
    let verdict = h.curator.run_fraud_detection(BBVA_REPORT, &options()).await.unwrap();
    assert_eq!(
        verdict.explanation,
        "Posing as a trusted institution to extract consent."
    );
}

#[tokio::test]
async fn classifier_sees_known_types() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));
    h.curator.run_fraud_detection(BBVA_REPORT, &options()).await.unwrap();

    let known = h.reasoner.seen_known.lock().unwrap();
    assert_eq!(known.len(), 1);
    assert!(known[0].contains(&"IMPERSONATION".to_string()));
    assert!(known[0].contains(&"PHISHING".to_string()));
}

#[tokio::test]
async fn new_type_is_registered_once() {
    let h = harness(StubReasoner::proposing("sim swap"));
    let report = "Mi linea dejo de funcionar y luego vaciaron mi cuenta.";

    let first = h.curator.run_fraud_detection(report, &options()).await.unwrap();
    assert_eq!(first.fraud_type.as_deref(), Some("SIM_SWAP"));
    assert_eq!(first.new_type_name.as_deref(), Some("SIM_SWAP"));
    assert_eq!(h.curator.registry().match_name("Sim Swap").as_deref(), Some("SIM_SWAP"));

    let second = h.curator.run_fraud_detection(report, &options()).await.unwrap();
    assert_eq!(second.fraud_type.as_deref(), Some("SIM_SWAP"));
    assert_eq!(second.new_type_name, None);
    assert!(second.should_alert);

    let count = h
        .curator
        .registry()
        .known_names()
        .iter()
        .filter(|n| n.as_str() == "SIM_SWAP")
        .count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unlisted_type_without_proposal_is_registered() {
    let h = harness(StubReasoner::fraud("QR swap"));
    let verdict = h
        .curator
        .run_fraud_detection("Pegaron un codigo QR falso encima del real.", &options())
        .await
        .unwrap();
    assert_eq!(verdict.fraud_type.as_deref(), Some("QR_SWAP"));
    assert_eq!(verdict.new_type_name.as_deref(), Some("QR_SWAP"));
}

#[tokio::test]
async fn near_miss_maps_to_known_type() {
    let h = harness(StubReasoner::fraud("impersonations"));
    let types_before = h.curator.registry().len();
    let verdict = h.curator.run_fraud_detection(BBVA_REPORT, &options()).await.unwrap();
    assert_eq!(verdict.fraud_type.as_deref(), Some("IMPERSONATION"));
    assert_eq!(verdict.new_type_name, None);
    assert_eq!(h.curator.registry().len(), types_before);
}

#[tokio::test]
async fn summary_stage_is_optional() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));

    let with_summary = h.curator.run_fraud_detection(BBVA_REPORT, &options()).await.unwrap();
    let summary = with_summary.summary.expect("summary on fraud branch");
    assert_eq!(summary.summary, "IMPERSONATION attempt");

    let without = h
        .curator
        .run_fraud_detection(BBVA_REPORT, &options().with_summary(false))
        .await
        .unwrap();
    assert_eq!(without.summary, None);
    assert!(without.is_fraud);
    assert_eq!(h.reasoner.summarize_calls(), 1);
}

#[tokio::test]
async fn similar_case_count_follows_k() {
    let h = harness(StubReasoner::clean());
    for i in 0..5 {
        h.curator
            .add_case(&format!("caso historico numero {i} sobre compras"), None, TIMEOUT)
            .await
            .unwrap();
    }

    let verdict = h
        .curator
        .run_fraud_detection("consulta sobre compras recientes", &options().with_k(2))
        .await
        .unwrap();
    assert_eq!(verdict.similar_cases_count, 2);
    assert_eq!(h.reasoner.seen_similar.lock().unwrap()[0].len(), 2);
}

#[tokio::test]
async fn remembered_cases_feed_later_runs() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));
    let opts = options().remembering_cases(true);

    let first = h.curator.run_fraud_detection(BBVA_REPORT, &opts).await.unwrap();
    assert_eq!(first.similar_cases_count, 0);
    assert_eq!(h.curator.index().len().await.unwrap(), 1);

    let second = h.curator.run_fraud_detection(BBVA_REPORT, &opts).await.unwrap();
    assert_eq!(second.similar_cases_count, 1);
}

#[tokio::test]
async fn clean_cases_are_not_remembered() {
    let h = harness(StubReasoner::clean());
    let opts = options().remembering_cases(true);
    h.curator
        .run_fraud_detection("El vendedor no me entrego el paquete.", &opts)
        .await
        .unwrap();
    assert_eq!(h.curator.index().len().await.unwrap(), 0);
}
