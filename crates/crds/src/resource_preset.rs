//! ResourcePreset CRD
//!
//! A named bundle of CPU/memory requests and limits. Workloads opt in by
//! carrying the preset label; the controller fills their container
//! resources from the referenced preset.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "presetter.xamma.dev",
    version = "v1",
    kind = "ResourcePreset",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePresetSpec {
    /// CPU request for each container (e.g. "100m")
    pub cpu_requests: Quantity,

    /// CPU limit for each container (e.g. "200m")
    pub cpu_limits: Quantity,

    /// Memory request for each container (e.g. "128Mi")
    pub memory_requests: Quantity,

    /// Memory limit for each container (e.g. "256Mi")
    pub memory_limits: Quantity,
}
