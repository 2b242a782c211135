//! Kubernetes resource watchers.
//!
//! Wires the registered reconciliation strategy into a controller stream.
//! One generic watch loop serves both workload kinds; the strategy behind
//! the trait object decides what a cycle does. The stream serializes
//! cycles per key, so two reconciles for the same workload never overlap.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::reconciler::{ObjectKey, TargetReconciler};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{watcher, Controller};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Requeue delay floor for failed cycles
const BACKOFF_FLOOR_SECONDS: u64 = 5;
/// Requeue delay cap for failed cycles
const BACKOFF_CAP_SECONDS: u64 = 300;

/// Shared state for one watch stream
struct WatchContext {
    reconciler: Arc<dyn TargetReconciler>,
    shutdown: CancellationToken,
    /// Per-key requeue delay, reset on the next successful cycle
    backoffs: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl WatchContext {
    fn next_backoff(&self, key: &ObjectKey) -> Duration {
        match self.backoffs.lock() {
            Ok(mut backoffs) => backoffs
                .entry(key.to_string())
                .or_insert_with(|| {
                    FibonacciBackoff::new(BACKOFF_FLOOR_SECONDS, BACKOFF_CAP_SECONDS)
                })
                .next_backoff(),
            Err(_) => {
                warn!("Backoff state unavailable, requeueing {} at floor", key);
                Duration::from_secs(BACKOFF_FLOOR_SECONDS)
            }
        }
    }

    fn reset_backoff(&self, key: &ObjectKey) {
        if let Ok(mut backoffs) = self.backoffs.lock() {
            if let Some(backoff) = backoffs.get_mut(&key.to_string()) {
                backoff.reset();
            }
        }
    }
}

/// Generic watch loop over one workload kind
///
/// Failed cycles requeue with a per-key Fibonacci delay. Successful ones
/// wait for the next change event. When the shutdown token fires the
/// stream stops scheduling new cycles and drains the ones in flight.
async fn watch_resource<K>(
    api: Api<K>,
    reconciler: Arc<dyn TargetReconciler>,
    shutdown: CancellationToken,
) -> Result<(), ControllerError>
where
    K: kube::Resource
        + Clone
        + Send
        + Sync
        + 'static
        + std::fmt::Debug
        + serde::de::DeserializeOwned,
    K::DynamicType: Default + Eq + std::hash::Hash + Clone + std::fmt::Debug + Unpin,
{
    let resource_name = reconciler.kind();
    info!("Starting {} watcher", resource_name);

    let context = Arc::new(WatchContext {
        reconciler,
        shutdown: shutdown.clone(),
        backoffs: Mutex::new(HashMap::new()),
    });

    let reconcile = move |obj: Arc<K>, ctx: Arc<WatchContext>| async move {
        let key = object_key(obj.as_ref());
        debug!("Reconciling {} {}", resource_name, key);

        let outcome = ctx.reconciler.reconcile_target(&key, &ctx.shutdown).await?;
        ctx.reset_backoff(&key);
        debug!("Reconciled {} {}: {:?}", resource_name, key, outcome);

        Ok(Action::await_change())
    };

    let error_policy = move |obj: Arc<K>, error: &ControllerError, ctx: Arc<WatchContext>| {
        let key = object_key(obj.as_ref());
        let delay = ctx.next_backoff(&key);
        error!(
            "Reconciliation error for {} {}: {} (requeue in {:?})",
            resource_name, key, error, delay
        );
        Action::requeue(delay)
    };

    // Distinct keys may reconcile in parallel; the stream still runs at
    // most one cycle per key at a time
    let controller_config = ControllerConfig::default().concurrency(4);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .graceful_shutdown_on(shutdown.cancelled_owned())
        .run(reconcile, error_policy, context)
        .for_each(move |result| async move {
            if let Err(e) = result {
                error!("Controller error for {}: {}", resource_name, e);
            }
        })
        .await;

    info!("{} watcher stopped", resource_name);
    Ok(())
}

/// Build the reconcile key from a watched object's metadata
fn object_key<K: kube::Resource>(obj: &K) -> ObjectKey {
    ObjectKey::new(
        obj.namespace().unwrap_or_else(|| "default".to_string()),
        obj.name_any(),
    )
}

/// Watches workload resources for changes.
pub struct Watcher {
    reconciler: Arc<dyn TargetReconciler>,
    shutdown: CancellationToken,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(reconciler: Arc<dyn TargetReconciler>, shutdown: CancellationToken) -> Self {
        Watcher {
            reconciler,
            shutdown,
        }
    }

    /// Starts watching Deployment resources.
    pub async fn watch_deployments(&self, api: Api<Deployment>) -> Result<(), ControllerError> {
        watch_resource(api, self.reconciler.clone(), self.shutdown.clone()).await
    }

    /// Starts watching Pod resources.
    pub async fn watch_pods(&self, api: Api<Pod>) -> Result<(), ControllerError> {
        watch_resource(api, self.reconciler.clone(), self.shutdown.clone()).await
    }
}
