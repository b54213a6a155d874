//! Fixed-order bootstrap plans and the manifests their steps create.
//!
//! The per-step `OnExists` policy is a table, not a rule: a pre-existing
//! ClusterClaim signals a re-initialization attempt and fails, the
//! member-token Secret is rotated in place, and the helper objects are
//! plain idempotent skips.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fedset_core::{
    BootstrapPlan, OnExists, PlanStep, ResourceRef, CLUSTER_CLAIM_CLUSTERSET, CLUSTER_CLAIM_ID,
    DEFAULT_MEMBER_TOKEN, MEMBER_CLUSTER_ROLE,
};
use serde_json::{json, Value as Json};

use crate::config::{InitConfig, JoinConfig};
use crate::credential::{ResolvedToken, FIELD_CA_CRT, FIELD_NAMESPACE, FIELD_TOKEN};

/// API group/version of the ClusterSet control objects.
pub const GROUP_VERSION: &str = "multicluster.fedset.io/v1alpha2";
const RBAC_GROUP_VERSION: &str = "rbac.authorization.k8s.io/v1";
const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";
const SERVICE_ACCOUNT_ANNOTATION: &str = "kubernetes.io/service-account.name";

fn step(kind: &str, namespace: &str, name: &str, payload: Json, on_exists: OnExists) -> PlanStep {
    PlanStep {
        resource: ResourceRef::namespaced(kind, namespace, name),
        payload,
        on_exists,
    }
}

/// Build the init plan. `token` is the freshly generated member token
/// value when token creation was requested.
pub fn init_plan(config: &InitConfig, token: Option<&str>) -> BootstrapPlan {
    let ns = &config.namespace;
    let mut steps = vec![
        step(
            "ClusterClaim",
            ns,
            CLUSTER_CLAIM_ID,
            cluster_claim(ns, CLUSTER_CLAIM_ID, &config.cluster_id),
            OnExists::Fail,
        ),
        step(
            "ClusterClaim",
            ns,
            CLUSTER_CLAIM_CLUSTERSET,
            cluster_claim(ns, CLUSTER_CLAIM_CLUSTERSET, &config.clusterset),
            OnExists::Fail,
        ),
        step(
            "ClusterSet",
            ns,
            &config.clusterset,
            json!({
                "apiVersion": GROUP_VERSION,
                "kind": "ClusterSet",
                "metadata": { "name": config.clusterset, "namespace": ns },
                "spec": {
                    "leaders": [ { "clusterID": config.cluster_id } ],
                    "namespace": ns,
                },
            }),
            OnExists::Fail,
        ),
        step(
            "ServiceAccount",
            ns,
            DEFAULT_MEMBER_TOKEN,
            json!({
                "apiVersion": "v1",
                "kind": "ServiceAccount",
                "metadata": { "name": DEFAULT_MEMBER_TOKEN, "namespace": ns },
            }),
            OnExists::Skip,
        ),
        step(
            "RoleBinding",
            ns,
            DEFAULT_MEMBER_TOKEN,
            json!({
                "apiVersion": RBAC_GROUP_VERSION,
                "kind": "RoleBinding",
                "metadata": { "name": DEFAULT_MEMBER_TOKEN, "namespace": ns },
                "roleRef": {
                    "apiGroup": "rbac.authorization.k8s.io",
                    "kind": "ClusterRole",
                    "name": MEMBER_CLUSTER_ROLE,
                },
                "subjects": [ {
                    "kind": "ServiceAccount",
                    "name": DEFAULT_MEMBER_TOKEN,
                    "namespace": ns,
                } ],
            }),
            OnExists::Skip,
        ),
    ];
    if let Some(token) = token {
        // Replace rotates the token when the Secret already exists.
        steps.push(step(
            "Secret",
            ns,
            DEFAULT_MEMBER_TOKEN,
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": {
                    "name": DEFAULT_MEMBER_TOKEN,
                    "namespace": ns,
                    "annotations": { (SERVICE_ACCOUNT_ANNOTATION): DEFAULT_MEMBER_TOKEN },
                },
                "type": SERVICE_ACCOUNT_TOKEN_TYPE,
                "data": { (FIELD_TOKEN): BASE64.encode(token) },
            }),
            OnExists::Replace,
        ));
    }
    BootstrapPlan { steps }
}

/// Build the join plan: the member token Secret, then the member-side
/// ClusterSet registration referencing it.
pub fn join_plan(config: &JoinConfig, token: &ResolvedToken) -> BootstrapPlan {
    let ns = &config.namespace;
    let cred = &token.credential;
    let steps = vec![
        step(
            "Secret",
            ns,
            &token.secret_name,
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": { "name": token.secret_name, "namespace": ns },
                "type": "Opaque",
                "data": {
                    (FIELD_CA_CRT): BASE64.encode(&cred.ca_crt),
                    (FIELD_NAMESPACE): BASE64.encode(&cred.namespace),
                    (FIELD_TOKEN): BASE64.encode(&cred.token),
                },
            }),
            OnExists::Skip,
        ),
        // Replace lets a re-join refresh the registration in place.
        step(
            "ClusterSet",
            ns,
            &config.clusterset_id,
            json!({
                "apiVersion": GROUP_VERSION,
                "kind": "ClusterSet",
                "metadata": { "name": config.clusterset_id, "namespace": ns },
                "spec": {
                    "leaders": [ {
                        "clusterID": config.leader_cluster_id,
                        "secret": token.secret_name,
                        "server": config.leader_api_server,
                    } ],
                    "namespace": config.leader_namespace,
                },
            }),
            OnExists::Replace,
        ),
    ];
    BootstrapPlan { steps }
}

fn cluster_claim(namespace: &str, name: &str, value: &str) -> Json {
    json!({
        "apiVersion": GROUP_VERSION,
        "kind": "ClusterClaim",
        "metadata": { "name": name, "namespace": namespace },
        "value": value,
    })
}
