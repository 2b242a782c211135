//! Controller-specific error types.
//!
//! This module defines error types specific to the presetter controller
//! that are not covered by the store or library errors.

use kube::Error as KubeError;
use thiserror::Error;
use workload_store::StoreError;

/// Errors that can occur in the presetter controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Workload store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A workload names a preset that does not exist
    #[error("ResourcePreset {namespace}/{name} not found")]
    PresetMissing {
        /// Namespace the preset was looked up in
        namespace: String,
        /// Preset name taken from the workload label
        name: String,
    },

    /// An update kept conflicting up to the attempt ceiling
    #[error("update of {kind} {namespace}/{name} conflicted on all {attempts} attempts")]
    Conflict {
        /// Workload kind that was being updated
        kind: &'static str,
        /// Workload namespace
        namespace: String,
        /// Workload name
        name: String,
        /// Number of write attempts made
        attempts: u32,
        /// Conflict returned by the final attempt
        #[source]
        source: StoreError,
    },

    /// Reconcile aborted because shutdown was requested
    #[error("reconcile cancelled by shutdown")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
