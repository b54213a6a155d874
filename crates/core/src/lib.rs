//! Fedset core types: resource identity, bootstrap plans, and the error
//! taxonomy shared across the workspace.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known ClusterClaim name carrying the local cluster's own ID.
pub const CLUSTER_CLAIM_ID: &str = "id.k8s.io";
/// Well-known ClusterClaim name carrying the ClusterSet membership claim.
pub const CLUSTER_CLAIM_CLUSTERSET: &str = "clusterset.k8s.io";
/// Conventional name shared by the member-token ServiceAccount,
/// RoleBinding and Secret created during init.
pub const DEFAULT_MEMBER_TOKEN: &str = "default-member-token";
/// ClusterRole granted to the member-token ServiceAccount.
pub const MEMBER_CLUSTER_ROLE: &str = "fedset-member-cluster-role";

/// Identity of one object in the resource store. Immutable once built.
/// Every object the orchestrator touches is namespace-scoped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn namespaced(kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind, self.name)
    }
}

/// What to do when a plan step finds its object already in the store.
///
/// The policy is per step, not global: a pre-existing ClusterClaim means a
/// re-initialization attempt and must fail, while a pre-existing token
/// Secret is rotated in place (delete then recreate).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OnExists {
    /// Existence is a genuine conflict; surface it.
    Fail,
    /// Existence satisfies the step; report "already exists" and move on.
    Skip,
    /// Delete the existing object and recreate it from the step payload.
    Replace,
}

/// One ordered creation step of a bootstrap plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub resource: ResourceRef,
    pub payload: serde_json::Value,
    pub on_exists: OnExists,
}

/// Ordered creation steps. Built fresh per invocation, never persisted;
/// order is the contract for both creation and compensating rollback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapPlan {
    pub steps: Vec<PlanStep>,
}

impl BootstrapPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Errors reported by the resource store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    AlreadyExists(ResourceRef),
    #[error("{0} not found")]
    NotFound(ResourceRef),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Terminal errors of `init`/`join`.
///
/// Validation and Resolution are fail-fast with zero store writes, so
/// re-running after fixing input is always safe. Creation is surfaced
/// unchanged after rollback so the root cause is preserved; rollback
/// delete failures are logged warnings, never promoted here.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Resolution(String),
    #[error("failed to create {resource}: {source}")]
    Creation {
        resource: ResourceRef,
        #[source]
        source: StoreError,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
