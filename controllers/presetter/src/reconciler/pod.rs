//! Replace-and-delete strategy for Pods
//!
//! A running Pod's resources cannot be edited in place, so the strategy
//! clones the Pod, stamps the preset over every slot, creates the clone
//! under a derived name, and then deletes the original. The derived name
//! makes the cycle idempotent: once the replacement exists, further cycles
//! for the same pod no-op, including replays after a crash between the
//! create and the delete.

use super::{ensure_active, lookup_preset, ObjectKey, Outcome, TargetReconciler};
use crate::defaulting::{apply_preset, DefaultingPolicy};
use crate::error::ControllerError;
use crate::resolver::{self, PRESET_LABEL};
use crds::ResourcePresetSpec;
use k8s_openapi::api::core::v1::Pod;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use workload_store::WorkloadStore;

/// Suffix appended to the original name to derive the replacement's name
pub const REPLACEMENT_SUFFIX: &str = "-resized";

/// Derive the deterministic replacement name for an original pod name
pub fn replacement_name(original: &str) -> String {
    format!("{}{}", original, REPLACEMENT_SUFFIX)
}

/// Reconciles Pods by creating a resized replacement and deleting the
/// original
pub struct PodReconciler {
    store: Box<dyn WorkloadStore>,
}

impl PodReconciler {
    /// Create a reconciler backed by the given store
    pub fn new(store: impl WorkloadStore + 'static) -> Self {
        PodReconciler {
            store: Box::new(store),
        }
    }
}

#[async_trait::async_trait]
impl TargetReconciler for PodReconciler {
    fn kind(&self) -> &'static str {
        "Pod"
    }

    async fn reconcile_target(
        &self,
        key: &ObjectKey,
        shutdown: &CancellationToken,
    ) -> Result<Outcome, ControllerError> {
        ensure_active(shutdown)?;
        let original = match self.store.get_pod(&key.namespace, &key.name).await {
            Ok(pod) => pod,
            Err(e) if e.is_not_found() => {
                debug!("Pod {} no longer exists, nothing to reconcile", key);
                return Ok(Outcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(preset_name) =
            resolver::resolve(original.metadata.labels.as_ref()).map(str::to_string)
        else {
            debug!("Pod {} carries no preset label, skipping", key);
            return Ok(Outcome::Skipped);
        };

        ensure_active(shutdown)?;
        let preset = lookup_preset(self.store.as_ref(), key, &preset_name).await?;

        let clone_name = replacement_name(&key.name);
        ensure_active(shutdown)?;
        match self.store.get_pod(&key.namespace, &clone_name).await {
            Ok(_) => {
                debug!(
                    "Replacement {}/{} already exists for Pod {}, skipping",
                    key.namespace, clone_name, key
                );
                return Ok(Outcome::Skipped);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let replacement = build_replacement(&original, &preset.spec);

        ensure_active(shutdown)?;
        self.store.create_pod(&replacement).await?;
        info!(
            "Created replacement Pod {}/{} sized by preset {}",
            key.namespace, clone_name, preset_name
        );

        ensure_active(shutdown)?;
        match self.store.delete_pod(&key.namespace, &key.name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!("Pod {} already gone before delete", key);
            }
            Err(e) => return Err(e.into()),
        }
        info!("Replaced Pod {} with {}/{}", key, key.namespace, clone_name);

        Ok(Outcome::Replaced)
    }
}

/// Turn the original into a creatable clone carrying the preset sizing
fn build_replacement(original: &Pod, preset: &ResourcePresetSpec) -> Pod {
    let mut replacement = original.clone();
    replacement.metadata.name = original.metadata.name.as_deref().map(replacement_name);

    // Server-populated identity must not ride along on a create
    replacement.metadata.resource_version = None;
    replacement.metadata.uid = None;
    replacement.metadata.creation_timestamp = None;
    replacement.metadata.managed_fields = None;
    replacement.status = None;

    // The clone must not re-enter the replacement path itself
    if let Some(labels) = replacement.metadata.labels.as_mut() {
        labels.remove(PRESET_LABEL);
    }

    if let Some(spec) = replacement.spec.as_mut() {
        apply_preset(&mut spec.containers, preset, DefaultingPolicy::AlwaysOverwrite);
    }

    replacement
}
