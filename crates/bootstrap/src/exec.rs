//! Saga-style plan execution.
//!
//! Forward progress is append-only to the rollback log; the first hard
//! failure replays that log in reverse as compensating deletes, bounded
//! to the steps this invocation actually applied, then surfaces the
//! original creation error. `NotFound` during compensation means the
//! object is already gone and is never escalated; any other delete
//! failure is a logged warning and never aborts the sweep.

use fedset_core::{BootstrapError, BootstrapPlan, OnExists, PlanStep, ResourceRef};
use fedset_store::ResourceStore;
use metrics::counter;
use std::io::Write;
use tracing::{debug, info, warn};

/// Executor lifecycle. Terminal states are `Committed` and `RolledBack`;
/// there is no retry within one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Pending,
    Applying(usize),
    RollingBack(usize),
    Committed,
    RolledBack,
}

pub struct TransactionExecutor<'a> {
    store: &'a dyn ResourceStore,
    state: ExecState,
    rollback_log: Vec<ResourceRef>,
}

impl<'a> TransactionExecutor<'a> {
    pub fn new(store: &'a dyn ResourceStore) -> Self {
        Self {
            store,
            state: ExecState::Pending,
            rollback_log: Vec::new(),
        }
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    /// Refs created so far in this invocation, in creation order.
    pub fn applied(&self) -> &[ResourceRef] {
        &self.rollback_log
    }

    /// Run the plan to `Committed`, or roll back and return the original
    /// creation error. Progress lines go to `out`; sink failures are
    /// ignored rather than aborting cluster mutations.
    pub async fn run(
        &mut self,
        plan: &BootstrapPlan,
        out: &mut dyn Write,
    ) -> Result<(), BootstrapError> {
        for (i, step) in plan.steps.iter().enumerate() {
            self.state = ExecState::Applying(i);
            if let Err(err) = self.apply_step(step, out).await {
                self.rollback(i).await;
                self.state = ExecState::RolledBack;
                return Err(err);
            }
        }
        self.state = ExecState::Committed;
        debug!(steps = plan.len(), "plan committed");
        Ok(())
    }

    async fn apply_step(
        &mut self,
        step: &PlanStep,
        out: &mut dyn Write,
    ) -> Result<(), BootstrapError> {
        let resource = &step.resource;
        match self.store.create(resource, &step.payload).await {
            Ok(()) => {
                self.record_created(resource, out);
                Ok(())
            }
            Err(err) if err.is_already_exists() => match step.on_exists {
                OnExists::Fail => Err(BootstrapError::Creation {
                    resource: resource.clone(),
                    source: err,
                }),
                OnExists::Skip => {
                    counter!("bootstrap_steps_skipped_total", 1u64);
                    let _ = writeln!(out, "{resource} already exists");
                    Ok(())
                }
                OnExists::Replace => {
                    let _ = writeln!(out, "{resource} already exists");
                    match self.store.delete(resource).await {
                        Ok(()) => {}
                        Err(e) if e.is_not_found() => {}
                        Err(e) => {
                            return Err(BootstrapError::Creation {
                                resource: resource.clone(),
                                source: e,
                            })
                        }
                    }
                    self.store
                        .create(resource, &step.payload)
                        .await
                        .map_err(|e| BootstrapError::Creation {
                            resource: resource.clone(),
                            source: e,
                        })?;
                    self.record_created(resource, out);
                    Ok(())
                }
            },
            Err(err) => Err(BootstrapError::Creation {
                resource: resource.clone(),
                source: err,
            }),
        }
    }

    fn record_created(&mut self, resource: &ResourceRef, out: &mut dyn Write) {
        counter!("bootstrap_steps_applied_total", 1u64);
        self.rollback_log.push(resource.clone());
        let _ = writeln!(
            out,
            "{resource} created in Namespace {}",
            resource.namespace
        );
    }

    /// Compensate every prior step in exact reverse order of creation.
    /// The log is consumed here and discarded.
    async fn rollback(&mut self, failed_step: usize) {
        self.state = ExecState::RollingBack(failed_step);
        counter!("bootstrap_rollbacks_total", 1u64);
        warn!(
            failed_step,
            applied = self.rollback_log.len(),
            "step failed; rolling back applied steps"
        );
        for resource in std::mem::take(&mut self.rollback_log).into_iter().rev() {
            match self.store.delete(&resource).await {
                Ok(()) => info!(resource = %resource, "rolled back"),
                // Already gone: the compensation is satisfied.
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    counter!("bootstrap_rollback_delete_failures_total", 1u64);
                    warn!(resource = %resource, error = %e, "rollback delete failed");
                }
            }
        }
    }
}
