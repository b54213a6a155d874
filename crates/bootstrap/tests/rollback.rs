#![forbid(unsafe_code)]

use fedset_bootstrap::{init, InitConfig};
use fedset_store::{FaultyStore, MemoryStore};

fn config() -> InitConfig {
    InitConfig {
        namespace: "default".into(),
        clusterset: "test-clusterset".into(),
        cluster_id: "cluster-a".into(),
        create_token: true,
        output: None,
    }
}

#[tokio::test]
async fn midway_failure_rolls_back_every_prior_step() {
    // Fails on the ServiceAccount, after three successful creations.
    let store = FaultyStore::new(MemoryStore::new()).fail_create_at(3);
    let mut out = Vec::new();
    let err = init(&store, &config(), &mut out).await.unwrap_err();

    assert!(err.to_string().contains("injected create failure"), "{err}");
    assert!(
        store.inner().is_empty(),
        "leftovers: {:?}",
        store.inner().snapshot()
    );

    let trace = String::from_utf8(out).unwrap();
    assert!(trace.contains("ClusterSet \"test-clusterset\" created"), "{trace}");
    assert!(!trace.contains("Successfully initialized"), "{trace}");
}

#[tokio::test]
async fn last_step_failure_still_compensates_everything() {
    // Fails on the token Secret, the final store-visible step.
    let store = FaultyStore::new(MemoryStore::new()).fail_create_at(5);
    let mut out = Vec::new();
    let err = init(&store, &config(), &mut out).await.unwrap_err();

    assert!(err.to_string().contains("injected create failure"), "{err}");
    assert!(store.inner().is_empty());
}

#[tokio::test]
async fn vanished_object_does_not_derail_the_sweep() {
    // The clusterset claim reports created but never lands, so its
    // compensating delete observes NotFound; the sweep must finish and
    // the original error must survive unchanged.
    let store = FaultyStore::new(MemoryStore::new())
        .phantom_create_at(1)
        .fail_create_at(4);
    let mut out = Vec::new();
    let err = init(&store, &config(), &mut out).await.unwrap_err();

    assert!(err.to_string().contains("injected create failure"), "{err}");
    assert!(store.inner().is_empty());
}

#[tokio::test]
async fn failed_compensations_are_warnings_not_errors() {
    let store = FaultyStore::new(MemoryStore::new())
        .fail_create_at(2)
        .fail_deletes();
    let mut out = Vec::new();
    let err = init(&store, &config(), &mut out).await.unwrap_err();

    // The terminal error is the creation failure; delete failures during
    // rollback are logged only.
    assert!(err.to_string().contains("injected create failure"), "{err}");
    assert_eq!(store.inner().len(), 2);
}
