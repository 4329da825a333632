use std::sync::Arc;

use futures::future::join_all;

use curator_embedding::{CaseEncoder, InMemoryCaseIndex};
use fraud_curator::{FraudCurator, FraudTypeRegistry};

use crate::helpers::{harness, options, CountingEmbedder, StubReasoner, BBVA_REPORT};

fn shared_curator(reasoner: StubReasoner) -> Arc<FraudCurator> {
    Arc::new(FraudCurator::new(
        CaseEncoder::new(Arc::new(CountingEmbedder::new(false))),
        Arc::new(InMemoryCaseIndex::default()),
        Arc::new(reasoner),
        Arc::new(FraudTypeRegistry::with_defaults(0.85)),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_proposals_register_one_type() {
    let curator = shared_curator(StubReasoner::proposing("SIM_SWAP"));
    let before = curator.registry().len();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let curator = curator.clone();
            tokio::spawn(async move {
                let report = format!("Reporte {i}: mi linea fue clonada y vaciaron la cuenta.");
                curator.run_fraud_detection(&report, &options()).await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let verdict = handle.await.unwrap().unwrap();
        assert_eq!(verdict.fraud_type.as_deref(), Some("SIM_SWAP"));
        if verdict.new_type_name.is_some() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(curator.registry().len(), before + 1);
}

#[tokio::test]
async fn concurrent_runs_are_independent() {
    let h = harness(StubReasoner::fraud("IMPERSONATION"));
    let opts = options();

    let runs = (0..8).map(|_| h.curator.run_fraud_detection(BBVA_REPORT, &opts));
    let verdicts = join_all(runs).await;

    for verdict in verdicts {
        let verdict = verdict.unwrap();
        assert!(verdict.is_fraud);
        assert_eq!(verdict.fraud_type.as_deref(), Some("IMPERSONATION"));
        assert_eq!(verdict.similar_cases_count, 0);
    }
    assert_eq!(h.reasoner.analyze_calls(), 8);
    assert_eq!(h.reasoner.classify_calls(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn adds_are_visible_to_later_queries() {
    let curator = shared_curator(StubReasoner::clean());
    let timeout = options().timeout;

    let adds = (0..10).map(|i| {
        let curator = curator.clone();
        async move {
            curator
                .add_case(&format!("caso historico {i} de suplantacion"), None, timeout)
                .await
        }
    });
    for result in join_all(adds).await {
        result.unwrap();
    }

    assert_eq!(curator.index().len().await.unwrap(), 10);
    let verdict = curator
        .run_fraud_detection("otro caso de suplantacion bancaria", &options().with_k(10))
        .await
        .unwrap();
    assert_eq!(verdict.similar_cases_count, 10);
}
