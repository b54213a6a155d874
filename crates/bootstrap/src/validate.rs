//! Ordered field checks with first-failure short-circuit.
//!
//! The check order is part of the contract: callers surface exactly one
//! message, the first violated rule, and tests pin both the ordering and
//! the wording. Validation is pure; no store calls are made here.

use fedset_core::BootstrapError;

use crate::config::{InitConfig, JoinConfig};

pub const TOKEN_SOURCE_REQUIRED: &str = "a member token Secret must be provided through \
the Secret name, or the Secret file, or the Secret manifest in the config file";

fn first_failure(checks: &[(bool, &str)]) -> Result<(), BootstrapError> {
    for (failed, message) in checks {
        if *failed {
            return Err(BootstrapError::Validation((*message).to_string()));
        }
    }
    Ok(())
}

pub fn validate_init(config: &InitConfig) -> Result<(), BootstrapError> {
    first_failure(&[
        (config.namespace.is_empty(), "the Namespace is required"),
        (config.clusterset.is_empty(), "the ClusterSet is required"),
        (config.cluster_id.is_empty(), "the ClusterID is required"),
    ])
}

pub fn validate_join(config: &JoinConfig) -> Result<(), BootstrapError> {
    first_failure(&[
        (
            config.leader_cluster_id.is_empty(),
            "the ClusterID of the leader cluster is required",
        ),
        (
            config.leader_api_server.is_empty(),
            "the API server of the leader cluster is required",
        ),
        (config.populated_sources() != 1, TOKEN_SOURCE_REQUIRED),
        (
            config.leader_namespace.is_empty(),
            "the leader cluster Namespace is required",
        ),
        (
            config.clusterset_id.is_empty(),
            "the ClusterSet ID is required",
        ),
        (
            config.cluster_id.is_empty(),
            "the ClusterID of the member cluster is required",
        ),
    ])
}
