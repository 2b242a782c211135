//! Kubernetes-backed workload store

use crate::error::StoreError;
use crate::store_trait::WorkloadStore;
use crds::ResourcePreset;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// Workload store backed by the Kubernetes API server
///
/// Builds a namespaced `Api` handle per call; the client itself is cheap to
/// clone and share.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Create a store over an existing Kubernetes client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn presets(&self, namespace: &str) -> Api<ResourcePreset> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl WorkloadStore for KubeStore {
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, StoreError> {
        debug!("Fetching Deployment {}/{}", namespace, name);
        self.deployments(namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::classify("Deployment", namespace, name, e))
    }

    async fn update_deployment(&self, deployment: &Deployment) -> Result<Deployment, StoreError> {
        let namespace = deployment
            .metadata
            .namespace
            .as_deref()
            .ok_or(StoreError::MissingMetadata("namespace"))?;
        let name = deployment
            .metadata
            .name
            .as_deref()
            .ok_or(StoreError::MissingMetadata("name"))?;
        debug!("Updating Deployment {}/{}", namespace, name);
        // replace() sends the object's resourceVersion, so the API server
        // enforces the optimistic-concurrency check
        self.deployments(namespace)
            .replace(name, &PostParams::default(), deployment)
            .await
            .map_err(|e| StoreError::classify("Deployment", namespace, name, e))
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, StoreError> {
        debug!("Fetching Pod {}/{}", namespace, name);
        self.pods(namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::classify("Pod", namespace, name, e))
    }

    async fn create_pod(&self, pod: &Pod) -> Result<Pod, StoreError> {
        let namespace = pod
            .metadata
            .namespace
            .as_deref()
            .ok_or(StoreError::MissingMetadata("namespace"))?;
        let name = pod
            .metadata
            .name
            .as_deref()
            .ok_or(StoreError::MissingMetadata("name"))?;
        debug!("Creating Pod {}/{}", namespace, name);
        self.pods(namespace)
            .create(&PostParams::default(), pod)
            .await
            .map_err(|e| StoreError::classify("Pod", namespace, name, e))
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        debug!("Deleting Pod {}/{}", namespace, name);
        self.pods(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::classify("Pod", namespace, name, e))
    }

    async fn get_preset(&self, namespace: &str, name: &str) -> Result<ResourcePreset, StoreError> {
        debug!("Fetching ResourcePreset {}/{}", namespace, name);
        self.presets(namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::classify("ResourcePreset", namespace, name, e))
    }
}
