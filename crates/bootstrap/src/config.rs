//! Init/join configuration records.
//!
//! Configuration is an explicit value threaded through each call; there
//! is no shared option state between invocations. A `JoinConfig` can be
//! loaded from a multi-document YAML config file whose first matching
//! document has kind `ClusterSetJoinConfig`; a `Secret` document in the
//! same stream becomes the embedded token manifest.

use fedset_core::BootstrapError;
use serde::Deserialize;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};

pub const JOIN_CONFIG_KIND: &str = "ClusterSetJoinConfig";

/// Options for initializing a new ClusterSet in the leader cluster.
#[derive(Debug, Clone, Default)]
pub struct InitConfig {
    pub namespace: String,
    pub clusterset: String,
    pub cluster_id: String,
    /// Create (or rotate) the member token Secret after the control
    /// objects exist.
    pub create_token: bool,
    /// Persist the member token manifest here instead of only printing it.
    pub output: Option<PathBuf>,
}

/// Options for joining an existing ClusterSet as a member cluster.
///
/// Exactly one of `token_secret_name`, `token_secret_file`, and
/// `token_secret_manifest` must be populated; the validator enforces
/// this before anything touches the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    #[serde(rename = "clusterSetID")]
    pub clusterset_id: String,
    #[serde(rename = "leaderClusterID")]
    pub leader_cluster_id: String,
    #[serde(rename = "leaderNamespace")]
    pub leader_namespace: String,
    #[serde(rename = "leaderAPIServer")]
    pub leader_api_server: String,
    pub namespace: String,
    #[serde(rename = "tokenSecretName")]
    pub token_secret_name: String,
    #[serde(rename = "tokenSecretFile")]
    pub token_secret_file: Option<PathBuf>,
    /// Secret-shaped document captured from the config file stream.
    #[serde(skip)]
    pub token_secret_manifest: Option<Json>,
}

/// The single credential source selected by a `JoinConfig`.
#[derive(Debug, Clone, Copy)]
pub enum CredentialSource<'a> {
    SecretName(&'a str),
    SecretFile(&'a Path),
    Manifest(&'a Json),
}

impl JoinConfig {
    fn has_secret_file(&self) -> bool {
        self.token_secret_file
            .as_deref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    /// Number of populated credential sources. Anything but 1 is a
    /// validation failure.
    pub(crate) fn populated_sources(&self) -> usize {
        usize::from(!self.token_secret_name.is_empty())
            + usize::from(self.has_secret_file())
            + usize::from(self.token_secret_manifest.is_some())
    }

    /// The selected credential source, if exactly one is populated.
    pub fn credential_source(&self) -> Option<CredentialSource<'_>> {
        if self.populated_sources() != 1 {
            return None;
        }
        if !self.token_secret_name.is_empty() {
            Some(CredentialSource::SecretName(&self.token_secret_name))
        } else if self.has_secret_file() {
            self.token_secret_file
                .as_deref()
                .map(CredentialSource::SecretFile)
        } else {
            self.token_secret_manifest
                .as_ref()
                .map(CredentialSource::Manifest)
        }
    }

    /// Load a join configuration from a multi-document YAML file.
    pub fn from_file(path: &Path) -> Result<Self, BootstrapError> {
        let raw = std::fs::read_to_string(path).map_err(|e| BootstrapError::Io {
            context: format!("reading config file {}", path.display()),
            source: e,
        })?;
        let parse_err = |e: &dyn std::fmt::Display| {
            BootstrapError::Resolution(format!(
                "failed to decode {} from config file {}: {}",
                JOIN_CONFIG_KIND,
                path.display(),
                e
            ))
        };

        let mut config: Option<JoinConfig> = None;
        let mut manifest: Option<Json> = None;
        for doc in serde_yaml::Deserializer::from_str(&raw) {
            let value = serde_yaml::Value::deserialize(doc).map_err(|e| parse_err(&e))?;
            match value.get("kind").and_then(|k| k.as_str()) {
                Some(JOIN_CONFIG_KIND) => {
                    config = Some(serde_yaml::from_value(value).map_err(|e| parse_err(&e))?);
                }
                Some("Secret") => {
                    manifest = Some(serde_json::to_value(value).map_err(|e| parse_err(&e))?);
                }
                _ => {}
            }
        }
        let mut config = config.ok_or_else(|| {
            BootstrapError::Resolution(format!(
                "no {} document found in config file {}",
                JOIN_CONFIG_KIND,
                path.display()
            ))
        })?;
        if config.token_secret_name.is_empty() && !config.has_secret_file() {
            config.token_secret_manifest = manifest;
        }
        Ok(config)
    }
}
