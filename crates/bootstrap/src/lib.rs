//! ClusterSet bootstrap orchestration: ordered validation, credential
//! resolution, fixed-order planning, and saga-style execution with
//! compensating rollback.
//!
//! The remote store offers no multi-object transaction primitive, so
//! `init`/`join` run an ordered plan whose successful creations are
//! logged append-only; the first hard failure replays that log in
//! reverse as compensating deletes and surfaces the original error.

#![forbid(unsafe_code)]

pub mod config;
pub mod credential;
pub mod exec;
pub mod plan;
pub mod validate;

mod init;
mod join;

pub use config::{CredentialSource, InitConfig, JoinConfig};
pub use credential::{Credential, ResolvedToken};
pub use exec::{ExecState, TransactionExecutor};
pub use init::init;
pub use join::join;
