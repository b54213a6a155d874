//! Joining an existing ClusterSet as a member cluster.

use fedset_core::BootstrapError;
use fedset_store::ResourceStore;
use std::io::Write;
use tracing::info;

use crate::config::JoinConfig;
use crate::exec::TransactionExecutor;
use crate::{credential, plan, validate};

/// Validate, resolve the member credential from its single configured
/// source, then register this cluster with the ClusterSet leader.
pub async fn join(
    store: &dyn ResourceStore,
    config: &JoinConfig,
    out: &mut dyn Write,
) -> Result<(), BootstrapError> {
    validate::validate_join(config)?;
    let token = credential::resolve(store, config).await?;
    let plan = plan::join_plan(config, &token);

    let mut executor = TransactionExecutor::new(store);
    executor.run(&plan, out).await?;

    let _ = writeln!(out, "Member cluster joined successfully");
    info!(
        clusterset = %config.clusterset_id,
        cluster = %config.cluster_id,
        leader = %config.leader_cluster_id,
        "member cluster joined"
    );
    Ok(())
}
