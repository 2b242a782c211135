//! WorkloadStore trait for mocking
//!
//! This trait abstracts the Kubernetes API server behind the small surface
//! the reconcilers actually use. The concrete `KubeStore` implements it, and
//! tests inject the in-memory `MockStore` instead.

use crate::error::StoreError;
use crds::ResourcePreset;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;

/// Trait for workload store operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing
/// runtime.
#[async_trait::async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Fetch a Deployment by namespace and name
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, StoreError>;

    /// Write a Deployment back. The write carries the object's version
    /// token; a stale token surfaces as `StoreError::Conflict`.
    async fn update_deployment(&self, deployment: &Deployment) -> Result<Deployment, StoreError>;

    /// Fetch a Pod by namespace and name
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, StoreError>;

    /// Create a new Pod. The object must not carry a version token.
    async fn create_pod(&self, pod: &Pod) -> Result<Pod, StoreError>;

    /// Delete a Pod by namespace and name
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    /// Fetch a ResourcePreset by namespace and name
    async fn get_preset(&self, namespace: &str, name: &str) -> Result<ResourcePreset, StoreError>;
}
