//! Mock workload store for unit testing
//!
//! In-memory implementation of `WorkloadStore` with real version-token
//! semantics, so reconcilers can be exercised without a cluster:
//!
//! - updates compare the incoming `resourceVersion` against the stored one
//!   and bump it on success
//! - creates reject objects that already carry a version token, as the API
//!   server does
//! - every operation is counted, and failures can be injected to drive
//!   conflict-retry and partial-failure paths deterministically

use crate::error::StoreError;
use crate::store_trait::WorkloadStore;
use crds::ResourcePreset;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Key = (String, String);

/// Edit applied to the stored Deployment when an injected conflict fires,
/// standing in for the concurrent writer that caused the conflict
type ConflictHook = Box<dyn Fn(&mut Deployment) + Send>;

/// Per-operation call counts, including rejected attempts
#[derive(Debug, Clone, Copy, Default)]
pub struct OpCounts {
    /// Deployment update attempts
    pub updates: u32,
    /// Pod create attempts
    pub creates: u32,
    /// Pod delete attempts
    pub deletes: u32,
    /// Reads of any kind
    pub gets: u32,
}

impl OpCounts {
    /// Total write attempts (updates + creates + deletes)
    pub fn writes(&self) -> u32 {
        self.updates + self.creates + self.deletes
    }
}

/// Mock workload store for testing
///
/// Cloning shares the underlying storage, so tests keep a handle for
/// seeding and assertions while the reconciler owns another.
#[derive(Clone, Default)]
pub struct MockStore {
    deployments: Arc<Mutex<HashMap<Key, Deployment>>>,
    pods: Arc<Mutex<HashMap<Key, Pod>>>,
    presets: Arc<Mutex<HashMap<Key, ResourcePreset>>>,
    counts: Arc<Mutex<OpCounts>>,
    update_conflicts: Arc<Mutex<u32>>,
    update_server_errors: Arc<Mutex<u32>>,
    delete_server_errors: Arc<Mutex<u32>>,
    conflict_hook: Arc<Mutex<Option<ConflictHook>>>,
}

impl MockStore {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Deployment to the store (for test setup)
    pub fn add_deployment(&self, mut deployment: Deployment) {
        if deployment.metadata.resource_version.is_none() {
            deployment.metadata.resource_version = Some("1".to_string());
        }
        let key = object_key(&deployment.metadata);
        self.deployments.lock().unwrap().insert(key, deployment);
    }

    /// Add a Pod to the store (for test setup)
    pub fn add_pod(&self, mut pod: Pod) {
        if pod.metadata.resource_version.is_none() {
            pod.metadata.resource_version = Some("1".to_string());
        }
        let key = object_key(&pod.metadata);
        self.pods.lock().unwrap().insert(key, pod);
    }

    /// Add a ResourcePreset to the store (for test setup)
    pub fn add_preset(&self, preset: ResourcePreset) {
        let key = object_key(&preset.metadata);
        self.presets.lock().unwrap().insert(key, preset);
    }

    /// Current copy of a stored Deployment
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.deployments.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    /// Current copy of a stored Pod
    pub fn pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        self.pods.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    /// Number of pods currently stored
    pub fn pod_count(&self) -> usize {
        self.pods.lock().unwrap().len()
    }

    /// Snapshot of the per-operation call counts
    pub fn counts(&self) -> OpCounts {
        *self.counts.lock().unwrap()
    }

    /// Reject the next `n` Deployment updates with a version conflict
    pub fn fail_updates_with_conflict(&self, n: u32) {
        *self.update_conflicts.lock().unwrap() = n;
    }

    /// Reject the next `n` Deployment updates with a server error
    pub fn fail_updates_with_server_error(&self, n: u32) {
        *self.update_server_errors.lock().unwrap() = n;
    }

    /// Reject the next `n` Pod deletes with a server error
    pub fn fail_deletes_with_server_error(&self, n: u32) {
        *self.delete_server_errors.lock().unwrap() = n;
    }

    /// Run `hook` against the stored Deployment whenever an injected
    /// conflict fires, mimicking the edit the concurrent writer made
    pub fn on_update_conflict(&self, hook: impl Fn(&mut Deployment) + Send + 'static) {
        *self.conflict_hook.lock().unwrap() = Some(Box::new(hook));
    }
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn object_key(metadata: &ObjectMeta) -> Key {
    (
        metadata.namespace.clone().unwrap_or_else(|| "default".to_string()),
        metadata.name.clone().unwrap_or_default(),
    )
}

fn bump_version(metadata: &mut ObjectMeta) {
    let next = metadata
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    metadata.resource_version = Some(next.to_string());
}

fn not_found(kind: &'static str, namespace: &str, name: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

fn conflict(kind: &'static str, namespace: &str, name: &str, message: &str) -> StoreError {
    StoreError::Conflict {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn server_error(message: &str) -> StoreError {
    StoreError::Api(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

fn invalid_create(message: &str) -> StoreError {
    StoreError::Api(kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "Invalid".to_string(),
        code: 422,
    }))
}

#[async_trait::async_trait]
impl WorkloadStore for MockStore {
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, StoreError> {
        self.counts.lock().unwrap().gets += 1;
        self.deployments
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found("Deployment", namespace, name))
    }

    async fn update_deployment(&self, deployment: &Deployment) -> Result<Deployment, StoreError> {
        self.counts.lock().unwrap().updates += 1;
        let key = object_key(&deployment.metadata);

        let inject_conflict = {
            let mut remaining = self.update_conflicts.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                true
            } else {
                false
            }
        };
        if inject_conflict {
            // The conflicting writer's edit lands in the store, so a
            // re-fetch observes it
            if let Some(existing) = self.deployments.lock().unwrap().get_mut(&key) {
                if let Some(hook) = self.conflict_hook.lock().unwrap().as_ref() {
                    hook(existing);
                }
                bump_version(&mut existing.metadata);
            }
            return Err(conflict("Deployment", &key.0, &key.1, "injected version conflict"));
        }

        {
            let mut remaining = self.update_server_errors.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(server_error("injected update failure"));
            }
        }

        let mut stored = self.deployments.lock().unwrap();
        let Some(existing) = stored.get_mut(&key) else {
            return Err(not_found("Deployment", &key.0, &key.1));
        };
        if existing.metadata.resource_version != deployment.metadata.resource_version {
            return Err(conflict(
                "Deployment",
                &key.0,
                &key.1,
                "the object has been modified; please apply your changes to the latest version",
            ));
        }
        let mut updated = deployment.clone();
        bump_version(&mut updated.metadata);
        *existing = updated.clone();
        Ok(updated)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, StoreError> {
        self.counts.lock().unwrap().gets += 1;
        self.pods
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found("Pod", namespace, name))
    }

    async fn create_pod(&self, pod: &Pod) -> Result<Pod, StoreError> {
        self.counts.lock().unwrap().creates += 1;
        if pod.metadata.resource_version.is_some() {
            return Err(invalid_create(
                "resourceVersion should not be set on objects to be created",
            ));
        }
        let key = object_key(&pod.metadata);
        let mut stored = self.pods.lock().unwrap();
        if stored.contains_key(&key) {
            return Err(conflict("Pod", &key.0, &key.1, "pod already exists"));
        }
        let mut created = pod.clone();
        created.metadata.resource_version = Some("1".to_string());
        stored.insert(key, created.clone());
        Ok(created)
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.counts.lock().unwrap().deletes += 1;
        {
            let mut remaining = self.delete_server_errors.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(server_error("injected delete failure"));
            }
        }
        self.pods
            .lock()
            .unwrap()
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| not_found("Pod", namespace, name))
    }

    async fn get_preset(&self, namespace: &str, name: &str) -> Result<ResourcePreset, StoreError> {
        self.counts.lock().unwrap().gets += 1;
        self.presets
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found("ResourcePreset", namespace, name))
    }
}
