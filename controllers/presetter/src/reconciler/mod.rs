//! Reconciliation strategies for preset targets
//!
//! Both watched kinds share the same shell: fetch the workload, resolve
//! its preset label, look the preset up, and apply it. The strategies
//! differ in how the result lands in the cluster. Deployments are updated
//! in place under optimistic concurrency; Pods are replaced, because a
//! running pod's resources cannot be edited. One strategy is registered
//! per process.

pub mod deployment;
pub mod pod;

use crate::error::ControllerError;
use crds::ResourcePreset;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::error;
use workload_store::WorkloadStore;

/// Key of the workload that triggered a reconcile cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    /// Workload namespace
    pub namespace: String,
    /// Workload name
    pub name: String,
}

impl ObjectKey {
    /// Build a key from namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectKey {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Result of one reconcile cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Workload gone or not opted in, nothing to do
    Skipped,
    /// Preset already in effect, no write issued
    Unchanged,
    /// Workload written back with absent slots filled
    Updated,
    /// Replacement pod created and the original deleted
    Replaced,
}

/// One reconciliation strategy, selected when the controller starts
#[async_trait::async_trait]
pub trait TargetReconciler: Send + Sync {
    /// Kind name for logs
    fn kind(&self) -> &'static str;

    /// Run one reconcile cycle for the workload at `key`
    ///
    /// The shutdown token is checked before every store call so a cycle
    /// in flight during shutdown stops at the next step boundary.
    async fn reconcile_target(
        &self,
        key: &ObjectKey,
        shutdown: &CancellationToken,
    ) -> Result<Outcome, ControllerError>;
}

/// Abort before the next store call once shutdown has been requested
pub(crate) fn ensure_active(shutdown: &CancellationToken) -> Result<(), ControllerError> {
    if shutdown.is_cancelled() {
        Err(ControllerError::Cancelled)
    } else {
        Ok(())
    }
}

/// Fetch the preset a workload references
///
/// A dangling reference is surfaced as a retryable error rather than a
/// skip, since the preset may simply not have been created yet.
pub(crate) async fn lookup_preset(
    store: &dyn WorkloadStore,
    key: &ObjectKey,
    preset_name: &str,
) -> Result<ResourcePreset, ControllerError> {
    match store.get_preset(&key.namespace, preset_name).await {
        Ok(preset) => Ok(preset),
        Err(e) if e.is_not_found() => {
            error!(
                "ResourcePreset {}/{} referenced by {} does not exist",
                key.namespace, preset_name, key
            );
            Err(ControllerError::PresetMissing {
                namespace: key.namespace.clone(),
                name: preset_name.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}
