//! Main controller implementation.
//!
//! This module contains the `Controller` struct that selects the target
//! strategy, wires it to a watch stream, and owns process shutdown.
//!
//! Exactly one target kind is reconciled per process:
//! - Deployment: fill absent pod-template resources in place
//! - Pod: replace the pod with a clone overwritten from the preset

use crate::error::ControllerError;
use crate::reconciler::deployment::DeploymentReconciler;
use crate::reconciler::pod::PodReconciler;
use crate::reconciler::TargetReconciler;
use crate::watcher::Watcher;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use workload_store::KubeStore;

/// Which workload kind this process reconciles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Reconcile Deployments with the in-place update strategy
    Deployment,
    /// Reconcile Pods with the replace-and-delete strategy
    Pod,
}

impl FromStr for TargetKind {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" => Ok(TargetKind::Deployment),
            "pod" => Ok(TargetKind::Pod),
            other => Err(ControllerError::InvalidConfig(format!(
                "unknown target kind '{}' (expected 'deployment' or 'pod')",
                other
            ))),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Deployment => write!(f, "deployment"),
            TargetKind::Pod => write!(f, "pod"),
        }
    }
}

/// Main controller for preset reconciliation.
pub struct Controller {
    watcher: JoinHandle<Result<(), ControllerError>>,
    shutdown: CancellationToken,
}

impl Controller {
    /// Creates the Kubernetes client, the store, and the watch task for
    /// the selected target kind.
    pub async fn new(
        target: TargetKind,
        namespace: Option<String>,
    ) -> Result<Self, ControllerError> {
        info!("Initializing Presetter Controller");

        // Create Kubernetes client
        let client = Client::try_default().await.map_err(ControllerError::Kube)?;
        let shutdown = CancellationToken::new();

        // The strategy is fixed at startup; the watch loop only ever sees
        // the trait object
        let watcher_task = match target {
            TargetKind::Deployment => {
                let reconciler: Arc<dyn TargetReconciler> =
                    Arc::new(DeploymentReconciler::new(KubeStore::new(client.clone())));
                let api = deployment_api(&client, namespace.as_deref());
                let watcher = Watcher::new(reconciler, shutdown.clone());
                tokio::spawn(async move { watcher.watch_deployments(api).await })
            }
            TargetKind::Pod => {
                let reconciler: Arc<dyn TargetReconciler> =
                    Arc::new(PodReconciler::new(KubeStore::new(client.clone())));
                let api = pod_api(&client, namespace.as_deref());
                let watcher = Watcher::new(reconciler, shutdown.clone());
                tokio::spawn(async move { watcher.watch_pods(api).await })
            }
        };

        // Stop scheduling new cycles and drain in-flight ones on Ctrl-C
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    signal_token.cancel();
                }
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
        });

        Ok(Controller {
            watcher: watcher_task,
            shutdown,
        })
    }

    /// Runs the controller until the watch stream drains.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Presetter Controller running");

        let result = (&mut self.watcher)
            .await
            .map_err(|e| ControllerError::Watch(format!("target watcher panicked: {}", e)))?;
        self.shutdown.cancel();
        result
    }
}

fn deployment_api(client: &Client, namespace: Option<&str>) -> Api<Deployment> {
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

fn pod_api(client: &Client, namespace: Option<&str>) -> Api<Pod> {
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}
