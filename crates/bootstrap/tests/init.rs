#![forbid(unsafe_code)]

use fedset_bootstrap::{init, InitConfig};
use fedset_core::{ResourceRef, DEFAULT_MEMBER_TOKEN};
use fedset_store::MemoryStore;
use serde_json::json;

fn config() -> InitConfig {
    InitConfig {
        namespace: "default".into(),
        clusterset: "test-clusterset".into(),
        cluster_id: "cluster-a".into(),
        create_token: true,
        output: None,
    }
}

fn token_secret_ref() -> ResourceRef {
    ResourceRef::namespaced("Secret", "default", DEFAULT_MEMBER_TOKEN)
}

#[tokio::test]
async fn init_on_empty_store_creates_all_steps_in_order() {
    let store = MemoryStore::new();
    let mut out = Vec::new();
    init(&store, &config(), &mut out).await.unwrap();

    let trace = String::from_utf8(out).unwrap();
    let expected_lines = [
        "ClusterClaim \"id.k8s.io\" created in Namespace default",
        "ClusterClaim \"clusterset.k8s.io\" created in Namespace default",
        "ClusterSet \"test-clusterset\" created in Namespace default",
        "ServiceAccount \"default-member-token\" created in Namespace default",
        "RoleBinding \"default-member-token\" created in Namespace default",
        "Secret \"default-member-token\" created in Namespace default",
        "Successfully initialized ClusterSet test-clusterset",
    ];
    let mut cursor = 0;
    for line in expected_lines {
        let at = trace[cursor..]
            .find(line)
            .unwrap_or_else(|| panic!("missing or out of order: {line}\ntrace:\n{trace}"));
        cursor += at + line.len();
    }
    assert_eq!(store.len(), 6);
}

#[tokio::test]
async fn init_without_token_creation_skips_the_secret() {
    let store = MemoryStore::new();
    let mut out = Vec::new();
    let cfg = InitConfig {
        create_token: false,
        ..config()
    };
    init(&store, &cfg, &mut out).await.unwrap();
    assert_eq!(store.len(), 5);
    assert!(!store.contains(&token_secret_ref()));
}

#[tokio::test]
async fn empty_namespace_fails_fast_with_zero_store_calls() {
    let store = MemoryStore::new();
    let mut out = Vec::new();
    let cfg = InitConfig {
        namespace: String::new(),
        ..config()
    };
    let err = init(&store, &cfg, &mut out).await.unwrap_err();
    assert_eq!(err.to_string(), "the Namespace is required");
    assert_eq!(store.call_count(), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn existing_token_secret_is_rotated() {
    let store = MemoryStore::with_objects([(
        token_secret_ref(),
        json!({"data": {"token": "b2xk"}}),
    )]);
    let mut out = Vec::new();
    init(&store, &config(), &mut out).await.unwrap();

    let trace = String::from_utf8(out).unwrap();
    assert!(
        trace.contains("Secret \"default-member-token\" already exists"),
        "{trace}"
    );
    let rotated = store.payload_of(&token_secret_ref()).unwrap();
    let new_token = rotated
        .pointer("/data/token")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();
    assert_ne!(new_token, "b2xk");
}

#[tokio::test]
async fn two_inits_mint_different_tokens() {
    let first = MemoryStore::new();
    let second = MemoryStore::new();
    let mut out = Vec::new();
    init(&first, &config(), &mut out).await.unwrap();
    init(&second, &config(), &mut out).await.unwrap();
    let token_of = |store: &MemoryStore| {
        store
            .payload_of(&token_secret_ref())
            .unwrap()
            .pointer("/data/token")
            .and_then(|v| v.as_str())
            .unwrap()
            .to_string()
    };
    assert_ne!(token_of(&first), token_of(&second));
}

#[tokio::test]
async fn output_path_persists_the_token_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("member-token.yml");
    let store = MemoryStore::new();
    let mut out = Vec::new();
    let cfg = InitConfig {
        output: Some(path.clone()),
        ..config()
    };
    init(&store, &cfg, &mut out).await.unwrap();

    let trace = String::from_utf8(out).unwrap();
    assert!(trace.contains("Member token saved to"), "{trace}");

    let manifest: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        manifest.get("kind").and_then(|v| v.as_str()),
        Some("Secret")
    );
    assert_eq!(
        manifest
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(|v| v.as_str()),
        Some(DEFAULT_MEMBER_TOKEN)
    );
}

#[tokio::test]
async fn reinitialization_is_rejected_by_the_id_claim() {
    let store = MemoryStore::new();
    let mut out = Vec::new();
    init(&store, &config(), &mut out).await.unwrap();

    let mut out = Vec::new();
    let err = init(&store, &config(), &mut out).await.unwrap_err();
    assert!(
        err.to_string()
            .contains("ClusterClaim \"id.k8s.io\" already exists"),
        "{err}"
    );
    // The failed re-run must not disturb the committed first run.
    assert_eq!(store.len(), 6);
}
