//! In-place update strategy for Deployments
//!
//! Fills absent container resources in the pod template and writes the
//! Deployment back under optimistic concurrency. On a version conflict the
//! strategy re-fetches the object and recomputes the defaults against the
//! fresh spec before retrying, so edits made by the concurrent writer are
//! never clobbered.

use super::{ensure_active, lookup_preset, ObjectKey, Outcome, TargetReconciler};
use crate::defaulting::{apply_preset, DefaultingPolicy};
use crate::error::ControllerError;
use crate::resolver;
use crds::ResourcePresetSpec;
use k8s_openapi::api::apps::v1::Deployment;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use workload_store::WorkloadStore;

/// Total write attempts per cycle before a conflict is escalated
const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// Reconciles Deployments by updating them in place
pub struct DeploymentReconciler {
    store: Box<dyn WorkloadStore>,
}

impl DeploymentReconciler {
    /// Create a reconciler backed by the given store
    pub fn new(store: impl WorkloadStore + 'static) -> Self {
        DeploymentReconciler {
            store: Box::new(store),
        }
    }

    /// Fetch the Deployment, returning None when it no longer exists
    async fn fetch(&self, key: &ObjectKey) -> Result<Option<Deployment>, ControllerError> {
        match self.store.get_deployment(&key.namespace, &key.name).await {
            Ok(deployment) => Ok(Some(deployment)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl TargetReconciler for DeploymentReconciler {
    fn kind(&self) -> &'static str {
        "Deployment"
    }

    async fn reconcile_target(
        &self,
        key: &ObjectKey,
        shutdown: &CancellationToken,
    ) -> Result<Outcome, ControllerError> {
        ensure_active(shutdown)?;
        let Some(mut deployment) = self.fetch(key).await? else {
            debug!("Deployment {} no longer exists, nothing to reconcile", key);
            return Ok(Outcome::Skipped);
        };

        let Some(mut preset_name) =
            resolver::resolve(deployment.metadata.labels.as_ref()).map(str::to_string)
        else {
            debug!("Deployment {} carries no preset label, skipping", key);
            return Ok(Outcome::Skipped);
        };

        ensure_active(shutdown)?;
        let mut preset = lookup_preset(self.store.as_ref(), key, &preset_name).await?;

        if !fill_template(&mut deployment, &preset.spec) {
            debug!("Deployment {} already sized by preset {}", key, preset_name);
            return Ok(Outcome::Unchanged);
        }

        let mut attempt = 1;
        loop {
            ensure_active(shutdown)?;
            match self.store.update_deployment(&deployment).await {
                Ok(_) => {
                    info!(
                        "Applied preset {} to Deployment {} (attempt {})",
                        preset_name, key, attempt
                    );
                    return Ok(Outcome::Updated);
                }
                Err(e) if e.is_conflict() && attempt < MAX_UPDATE_ATTEMPTS => {
                    warn!(
                        "Version conflict updating Deployment {} (attempt {}), re-fetching",
                        key, attempt
                    );

                    ensure_active(shutdown)?;
                    let Some(fresh) = self.fetch(key).await? else {
                        debug!("Deployment {} deleted during conflict retry", key);
                        return Ok(Outcome::Skipped);
                    };
                    deployment = fresh;

                    // The concurrent writer may have changed or removed the
                    // preset reference
                    match resolver::resolve(deployment.metadata.labels.as_ref())
                        .map(str::to_string)
                    {
                        None => {
                            debug!("Deployment {} no longer opts in, skipping", key);
                            return Ok(Outcome::Skipped);
                        }
                        Some(fresh_name) if fresh_name != preset_name => {
                            ensure_active(shutdown)?;
                            preset = lookup_preset(self.store.as_ref(), key, &fresh_name).await?;
                            preset_name = fresh_name;
                        }
                        Some(_) => {}
                    }

                    // Recompute against the fresh spec so the retried write
                    // carries the concurrent edits forward
                    if !fill_template(&mut deployment, &preset.spec) {
                        debug!("Deployment {} already sized after concurrent update", key);
                        return Ok(Outcome::Unchanged);
                    }
                    attempt += 1;
                }
                Err(e) if e.is_conflict() => {
                    return Err(ControllerError::Conflict {
                        kind: "Deployment",
                        namespace: key.namespace.clone(),
                        name: key.name.clone(),
                        attempts: MAX_UPDATE_ATTEMPTS,
                        source: e,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Run the fill-if-absent policy over the pod template's containers
fn fill_template(deployment: &mut Deployment, preset: &ResourcePresetSpec) -> bool {
    let Some(pod_spec) = deployment
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
    else {
        return false;
    };
    apply_preset(
        &mut pod_spec.containers,
        preset,
        DefaultingPolicy::FillIfAbsent,
    )
}
