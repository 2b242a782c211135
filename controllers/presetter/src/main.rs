//! Presetter Controller
//!
//! Watches workloads that opt in to resource defaulting through the
//! `presetter.xamma.dev/preset` label and applies the referenced
//! ResourcePreset to their containers:
//! - Deployment target: absent requests/limits are filled in place, so
//!   explicit sizing always wins
//! - Pod target: the pod is replaced by a clone whose requests/limits are
//!   overwritten from the preset
//!
//! Exactly one target kind is active per process, selected with the
//! `PRESETTER_TARGET` environment variable.

mod backoff;
mod controller;
mod defaulting;
mod error;
mod reconciler;
mod resolver;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::error::ControllerError;
use controller::{Controller, TargetKind};
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting Presetter Controller");

    // Load configuration from environment variables
    let target = env::var("PRESETTER_TARGET")
        .unwrap_or_else(|_| "deployment".to_string())
        .parse::<TargetKind>()?;
    let namespace = env::var("WATCH_NAMESPACE").ok();

    info!("Configuration:");
    info!("  Target kind: {}", target);
    info!(
        "  Namespace: {}",
        namespace.as_deref().unwrap_or("all namespaces")
    );

    // Initialize and run the controller
    let controller = Controller::new(target, namespace).await?;
    controller.run().await?;

    Ok(())
}
