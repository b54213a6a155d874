//! Kube-backed `ResourceStore` over `Api<DynamicObject>` with
//! discovery-based kind lookup.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use fedset_core::{ResourceRef, StoreError};
use kube::{
    api::{Api, DeleteParams, PostParams},
    core::DynamicObject,
    discovery::{Discovery, Scope},
    Client,
};
use serde_json::Value as Json;
use tracing::debug;

use crate::ResourceStore;

pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient kubeconfig / in-cluster environment.
    pub async fn try_default() -> anyhow::Result<Self> {
        let client = Client::try_default()
            .await
            .context("building kube client")?;
        Ok(Self::new(client))
    }

    async fn api_for(&self, resource: &ResourceRef) -> Result<Api<DynamicObject>, StoreError> {
        let discovery = Discovery::new(self.client.clone())
            .run()
            .await
            .map_err(|e| StoreError::Other(anyhow!(e).context("running API discovery")))?;
        for group in discovery.groups() {
            for (ar, caps) in group.recommended_resources() {
                if ar.kind != resource.kind {
                    continue;
                }
                let namespaced = matches!(caps.scope, Scope::Namespaced);
                debug!(kind = %ar.kind, group = %ar.group, version = %ar.version, namespaced, "resolved kind");
                let api = if namespaced {
                    Api::namespaced_with(self.client.clone(), &resource.namespace, &ar)
                } else {
                    Api::all_with(self.client.clone(), &ar)
                };
                return Ok(api);
            }
        }
        Err(StoreError::Other(anyhow!(
            "kind not served by the cluster: {}",
            resource.kind
        )))
    }
}

fn map_kube_err(resource: &ResourceRef, err: kube::Error) -> StoreError {
    match &err {
        kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound(resource.clone()),
        kube::Error::Api(resp) if resp.code == 409 => StoreError::AlreadyExists(resource.clone()),
        _ => StoreError::Other(anyhow!(err)),
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn create(&self, resource: &ResourceRef, payload: &Json) -> Result<(), StoreError> {
        let api = self.api_for(resource).await?;
        let obj: DynamicObject = serde_json::from_value(payload.clone())
            .map_err(|e| StoreError::Other(anyhow!(e).context("decoding step payload")))?;
        api.create(&PostParams::default(), &obj)
            .await
            .map_err(|e| map_kube_err(resource, e))?;
        Ok(())
    }

    async fn get(&self, resource: &ResourceRef) -> Result<Json, StoreError> {
        let api = self.api_for(resource).await?;
        let obj = api
            .get(&resource.name)
            .await
            .map_err(|e| map_kube_err(resource, e))?;
        serde_json::to_value(obj)
            .map_err(|e| StoreError::Other(anyhow!(e).context("encoding live object")))
    }

    async fn delete(&self, resource: &ResourceRef) -> Result<(), StoreError> {
        let api = self.api_for(resource).await?;
        api.delete(&resource.name, &DeleteParams::default())
            .await
            .map_err(|e| map_kube_err(resource, e))?;
        Ok(())
    }
}
