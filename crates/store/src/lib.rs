//! Fedset resource store: the create/get/delete contract the bootstrap
//! orchestrator runs against, with an in-memory double for tests and a
//! kube-backed implementation for real clusters.

#![forbid(unsafe_code)]

use async_trait::async_trait;
use fedset_core::{ResourceRef, StoreError};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

mod kube_store;
pub use kube_store::KubeStore;

/// Key-namespaced object store addressed by `{kind, namespace, name}`.
///
/// Implementations report `AlreadyExists` / `NotFound` precisely: the
/// executor's idempotency and rollback decisions hinge on those two
/// signals alone.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn create(&self, resource: &ResourceRef, payload: &Json) -> Result<(), StoreError>;
    async fn get(&self, resource: &ResourceRef) -> Result<Json, StoreError>;
    async fn delete(&self, resource: &ResourceRef) -> Result<(), StoreError>;
}

/// In-memory store used as the test double across the workspace.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<ResourceRef, Json>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with pre-existing objects.
    pub fn with_objects(objects: impl IntoIterator<Item = (ResourceRef, Json)>) -> Self {
        let store = Self::new();
        store
            .objects
            .lock()
            .expect("store lock")
            .extend(objects);
        store
    }

    /// Total create/get/delete calls observed, seeding excluded.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, resource: &ResourceRef) -> bool {
        self.objects
            .lock()
            .expect("store lock")
            .contains_key(resource)
    }

    pub fn payload_of(&self, resource: &ResourceRef) -> Option<Json> {
        self.objects
            .lock()
            .expect("store lock")
            .get(resource)
            .cloned()
    }

    /// Refs of every object currently stored.
    pub fn snapshot(&self) -> Vec<ResourceRef> {
        self.objects
            .lock()
            .expect("store lock")
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn create(&self, resource: &ResourceRef, payload: &Json) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().expect("store lock");
        if objects.contains_key(resource) {
            return Err(StoreError::AlreadyExists(resource.clone()));
        }
        objects.insert(resource.clone(), payload.clone());
        Ok(())
    }

    async fn get(&self, resource: &ResourceRef) -> Result<Json, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .expect("store lock")
            .get(resource)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(resource.clone()))
    }

    async fn delete(&self, resource: &ResourceRef) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.objects.lock().expect("store lock").remove(resource) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(resource.clone())),
        }
    }
}

/// Fault-injecting wrapper for exercising rollback paths in tests.
///
/// Create calls are counted across the wrapper's lifetime; the configured
/// faults key off that 0-based count.
pub struct FaultyStore<S> {
    inner: S,
    fail_create_at: Option<usize>,
    phantom_create_at: Option<usize>,
    fail_deletes: bool,
    creates: AtomicUsize,
}

impl<S> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_create_at: None,
            phantom_create_at: None,
            fail_deletes: false,
            creates: AtomicUsize::new(0),
        }
    }

    /// The n-th create call (0-based) errors without touching the store.
    pub fn fail_create_at(mut self, n: usize) -> Self {
        self.fail_create_at = Some(n);
        self
    }

    /// The n-th create call reports success but persists nothing, so a
    /// later compensating delete sees `NotFound`.
    pub fn phantom_create_at(mut self, n: usize) -> Self {
        self.phantom_create_at = Some(n);
        self
    }

    /// Every delete errors with a non-NotFound failure.
    pub fn fail_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ResourceStore> ResourceStore for FaultyStore<S> {
    async fn create(&self, resource: &ResourceRef, payload: &Json) -> Result<(), StoreError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_at == Some(n) {
            return Err(StoreError::Other(anyhow::anyhow!(
                "injected create failure at step {n}"
            )));
        }
        if self.phantom_create_at == Some(n) {
            return Ok(());
        }
        self.inner.create(resource, payload).await
    }

    async fn get(&self, resource: &ResourceRef) -> Result<Json, StoreError> {
        self.inner.get(resource).await
    }

    async fn delete(&self, resource: &ResourceRef) -> Result<(), StoreError> {
        if self.fail_deletes {
            return Err(StoreError::Other(anyhow::anyhow!(
                "injected delete failure for {resource}"
            )));
        }
        self.inner.delete(resource).await
    }
}
