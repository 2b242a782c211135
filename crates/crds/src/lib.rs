//! Presetter CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the presetter controllers.

pub mod resource_preset;

pub use resource_preset::*;
