//! Preset reference resolution
//!
//! Workloads opt in to resource defaulting by naming a ResourcePreset in a
//! well-known label. Resolution only reads the label; the preset lookup
//! happens later so that an unlabeled workload stays a clean no-op.

use std::collections::BTreeMap;

/// Label key naming the ResourcePreset a workload wants applied
pub const PRESET_LABEL: &str = "presetter.xamma.dev/preset";

/// Extract the preset name from a workload's labels
///
/// Returns `None` when the label map is missing or the key is absent.
/// Most workloads carry no preset reference, so absence is a skip signal
/// rather than an error.
pub fn resolve(labels: Option<&BTreeMap<String, String>>) -> Option<&str> {
    labels
        .and_then(|labels| labels.get(PRESET_LABEL))
        .map(String::as_str)
}
