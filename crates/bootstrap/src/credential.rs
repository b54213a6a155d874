//! Credential resolution from exactly one configured source.
//!
//! Resolution is side-effect-free: the named-secret source reads from
//! the store, the file and embedded-manifest sources only parse. The
//! three required `data` fields (`ca.crt`, `namespace`, `token`) must be
//! present and base64-decodable; anything else is a decode error naming
//! the origin and the offending field.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use fedset_core::{BootstrapError, ResourceRef, StoreError};
use fedset_store::ResourceStore;
use serde::Deserialize;
use serde_json::Value as Json;
use std::path::Path;

use crate::config::{CredentialSource, JoinConfig};
use crate::validate;

pub const FIELD_CA_CRT: &str = "ca.crt";
pub const FIELD_NAMESPACE: &str = "namespace";
pub const FIELD_TOKEN: &str = "token";

/// Fallback Secret name when a manifest carries no metadata.name.
const MEMBER_TOKEN_SECRET: &str = "member-token";

/// Decoded member credential. Built once, read-only afterward.
#[derive(Debug, Clone)]
pub struct Credential {
    pub namespace: String,
    pub ca_crt: Vec<u8>,
    pub token: Vec<u8>,
}

/// A resolved credential plus the Secret name the join plan will use.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    pub credential: Credential,
    pub secret_name: String,
}

pub async fn resolve(
    store: &dyn ResourceStore,
    config: &JoinConfig,
) -> Result<ResolvedToken, BootstrapError> {
    match config.credential_source() {
        Some(CredentialSource::SecretName(name)) => {
            let reference = ResourceRef::namespaced("Secret", &config.namespace, name);
            let payload = store.get(&reference).await.map_err(|e| match e {
                StoreError::NotFound(_) => BootstrapError::Resolution(format!(
                    "member token Secret \"{}\" not found in Namespace {}",
                    name, config.namespace
                )),
                other => BootstrapError::Resolution(format!(
                    "failed to read member token Secret \"{name}\": {other}"
                )),
            })?;
            Ok(ResolvedToken {
                credential: decode_secret(&payload, &format!("Secret \"{name}\""))?,
                secret_name: name.to_string(),
            })
        }
        Some(CredentialSource::SecretFile(path)) => from_file(path),
        Some(CredentialSource::Manifest(doc)) => Ok(ResolvedToken {
            credential: decode_secret(doc, "the Secret manifest in the config file")?,
            secret_name: manifest_name(doc),
        }),
        None => Err(BootstrapError::Validation(
            validate::TOKEN_SOURCE_REQUIRED.to_string(),
        )),
    }
}

/// Parse a token Secret file: a multi-document YAML stream containing
/// one Secret-shaped document.
pub fn from_file(path: &Path) -> Result<ResolvedToken, BootstrapError> {
    let origin = format!("token Secret file {}", path.display());
    // Unreadable and malformed sources share the resolution taxonomy:
    // both fail fast before any store write.
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BootstrapError::Resolution(format!("failed to read {origin}: {e}")))?;
    let doc = secret_document(&raw)
        .map_err(|e| decode_err(&origin, &e))?
        .ok_or_else(|| decode_err(&origin, "no Secret document found"))?;
    Ok(ResolvedToken {
        credential: decode_secret(&doc, &origin)?,
        secret_name: manifest_name(&doc),
    })
}

/// Locate the document with `kind: Secret` in a YAML stream.
fn secret_document(raw: &str) -> Result<Option<Json>, String> {
    for doc in serde_yaml::Deserializer::from_str(raw) {
        let value = serde_yaml::Value::deserialize(doc).map_err(|e| e.to_string())?;
        if value.get("kind").and_then(|k| k.as_str()) == Some("Secret") {
            return serde_json::to_value(value).map(Some).map_err(|e| e.to_string());
        }
    }
    Ok(None)
}

fn decode_secret(secret: &Json, origin: &str) -> Result<Credential, BootstrapError> {
    let data = secret
        .get("data")
        .and_then(|d| d.as_object())
        .ok_or_else(|| decode_err(origin, "missing data map"))?;
    let field = |name: &str| -> Result<Vec<u8>, BootstrapError> {
        let encoded = data
            .get(name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| decode_err(origin, &format!("missing data field {name}")))?;
        BASE64
            .decode(encoded.trim())
            .map_err(|_| decode_err(origin, &format!("data field {name} is not valid base64")))
    };
    let ca_crt = field(FIELD_CA_CRT)?;
    let namespace = field(FIELD_NAMESPACE)?;
    let token = field(FIELD_TOKEN)?;
    // Manifests routinely carry a trailing newline inside the payload.
    let namespace = String::from_utf8(namespace)
        .map_err(|_| decode_err(origin, "data field namespace is not valid UTF-8"))?
        .trim()
        .to_string();
    Ok(Credential {
        namespace,
        ca_crt,
        token,
    })
}

fn decode_err(origin: &str, detail: &str) -> BootstrapError {
    BootstrapError::Resolution(format!("failed to decode Secret from {origin}: {detail}"))
}

fn manifest_name(doc: &Json) -> String {
    doc.pointer("/metadata/name")
        .and_then(|v| v.as_str())
        .unwrap_or(MEMBER_TOKEN_SECRET)
        .to_string()
}
