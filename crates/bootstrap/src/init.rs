//! ClusterSet initialization in the leader cluster.

use fedset_core::BootstrapError;
use fedset_store::ResourceStore;
use std::io::Write;
use tracing::info;
use uuid::Uuid;

use crate::config::InitConfig;
use crate::exec::TransactionExecutor;
use crate::{plan, validate};

/// Create the ClusterSet control objects, optionally minting (or
/// rotating) the member token and persisting its manifest.
pub async fn init(
    store: &dyn ResourceStore,
    config: &InitConfig,
    out: &mut dyn Write,
) -> Result<(), BootstrapError> {
    validate::validate_init(config)?;

    let token = config
        .create_token
        .then(|| Uuid::new_v4().simple().to_string());
    let plan = plan::init_plan(config, token.as_deref());

    let mut executor = TransactionExecutor::new(store);
    executor.run(&plan, out).await?;

    // The manifest step has no store effect and never rolls back.
    if let Some(secret) = plan.steps.iter().find(|s| s.resource.kind == "Secret") {
        let manifest =
            serde_yaml::to_string(&secret.payload).map_err(|e| BootstrapError::Io {
                context: "rendering member token manifest".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
        match &config.output {
            Some(path) => {
                std::fs::write(path, &manifest).map_err(|e| BootstrapError::Io {
                    context: format!("writing member token to {}", path.display()),
                    source: e,
                })?;
                let _ = writeln!(out, "Member token saved to {}", path.display());
            }
            None => {
                let _ = writeln!(out, "{manifest}");
            }
        }
    }

    let _ = writeln!(
        out,
        "Successfully initialized ClusterSet {}",
        config.clusterset
    );
    info!(clusterset = %config.clusterset, namespace = %config.namespace, "clusterset initialized");
    Ok(())
}
