//! Defaulting engine
//!
//! Computes container resource slots from a preset under one of two named
//! policies. `FillIfAbsent` only sets slots the manifest left empty, so
//! explicit per-container sizing always wins; it backs the in-place
//! Deployment strategy. `AlwaysOverwrite` stamps the preset onto every
//! slot and backs the pod replacement strategy, where the clone is a
//! fresh object.

use crds::ResourcePresetSpec;
use k8s_openapi::api::core::v1::{Container, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// Resource map key for CPU quantities
pub const RESOURCE_CPU: &str = "cpu";
/// Resource map key for memory quantities
pub const RESOURCE_MEMORY: &str = "memory";

/// How a preset value lands in an already occupied slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultingPolicy {
    /// Set a slot only when it holds no value
    FillIfAbsent,
    /// Set a slot unconditionally
    AlwaysOverwrite,
}

/// Apply a preset to every container, reporting whether anything changed
///
/// A container without a resources block, or without a requests/limits
/// mapping, gets an empty mapping initialized before slots are assigned.
/// When this returns `false` the containers are untouched and no write
/// needs to be issued.
pub fn apply_preset(
    containers: &mut [Container],
    preset: &ResourcePresetSpec,
    policy: DefaultingPolicy,
) -> bool {
    let mut changed = false;

    for container in containers {
        let resources = container
            .resources
            .get_or_insert_with(ResourceRequirements::default);

        let requests = resources.requests.get_or_insert_with(BTreeMap::new);
        changed |= assign(requests, RESOURCE_CPU, &preset.cpu_requests, policy);
        changed |= assign(requests, RESOURCE_MEMORY, &preset.memory_requests, policy);

        let limits = resources.limits.get_or_insert_with(BTreeMap::new);
        changed |= assign(limits, RESOURCE_CPU, &preset.cpu_limits, policy);
        changed |= assign(limits, RESOURCE_MEMORY, &preset.memory_limits, policy);
    }

    changed
}

/// Set one slot according to the policy, reporting whether its value changed
fn assign(
    slots: &mut BTreeMap<String, Quantity>,
    key: &str,
    value: &Quantity,
    policy: DefaultingPolicy,
) -> bool {
    match policy {
        DefaultingPolicy::FillIfAbsent => {
            if slots.contains_key(key) {
                false
            } else {
                slots.insert(key.to_string(), value.clone());
                true
            }
        }
        DefaultingPolicy::AlwaysOverwrite => {
            let previous = slots.insert(key.to_string(), value.clone());
            previous.as_ref() != Some(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_container, create_test_preset_spec};

    fn preset() -> ResourcePresetSpec {
        create_test_preset_spec("100m", "200m", "128Mi", "256Mi")
    }

    fn slot(slots: Option<&BTreeMap<String, Quantity>>, key: &str) -> Option<String> {
        slots.and_then(|slots| slots.get(key)).map(|q| q.0.clone())
    }

    #[test]
    fn test_fill_initializes_missing_mappings() {
        let mut containers = vec![create_test_container("app")];
        assert!(containers[0].resources.is_none());

        let changed = apply_preset(&mut containers, &preset(), DefaultingPolicy::FillIfAbsent);

        assert!(changed);
        let resources = containers[0].resources.as_ref().unwrap();
        assert_eq!(
            slot(resources.requests.as_ref(), RESOURCE_CPU).as_deref(),
            Some("100m")
        );
        assert_eq!(
            slot(resources.requests.as_ref(), RESOURCE_MEMORY).as_deref(),
            Some("128Mi")
        );
        assert_eq!(
            slot(resources.limits.as_ref(), RESOURCE_CPU).as_deref(),
            Some("200m")
        );
        assert_eq!(
            slot(resources.limits.as_ref(), RESOURCE_MEMORY).as_deref(),
            Some("256Mi")
        );
    }

    #[test]
    fn test_fill_preserves_existing_values() {
        let mut container = create_test_container("app");
        container.resources = Some(ResourceRequirements {
            requests: Some(BTreeMap::from([(
                RESOURCE_CPU.to_string(),
                Quantity("250m".to_string()),
            )])),
            ..Default::default()
        });
        let mut containers = vec![container];

        let changed = apply_preset(&mut containers, &preset(), DefaultingPolicy::FillIfAbsent);

        assert!(changed);
        let resources = containers[0].resources.as_ref().unwrap();
        assert_eq!(
            slot(resources.requests.as_ref(), RESOURCE_CPU).as_deref(),
            Some("250m")
        );
        assert_eq!(
            slot(resources.requests.as_ref(), RESOURCE_MEMORY).as_deref(),
            Some("128Mi")
        );
    }

    #[test]
    fn test_fill_reports_unchanged_when_fully_sized() {
        let mut containers = vec![create_test_container("app")];
        apply_preset(&mut containers, &preset(), DefaultingPolicy::FillIfAbsent);

        let changed = apply_preset(&mut containers, &preset(), DefaultingPolicy::FillIfAbsent);

        assert!(!changed);
    }

    #[test]
    fn test_overwrite_replaces_existing_values() {
        let mut container = create_test_container("app");
        container.resources = Some(ResourceRequirements {
            limits: Some(BTreeMap::from([(
                RESOURCE_CPU.to_string(),
                Quantity("2".to_string()),
            )])),
            ..Default::default()
        });
        let mut containers = vec![container];

        let changed = apply_preset(&mut containers, &preset(), DefaultingPolicy::AlwaysOverwrite);

        assert!(changed);
        let resources = containers[0].resources.as_ref().unwrap();
        assert_eq!(
            slot(resources.limits.as_ref(), RESOURCE_CPU).as_deref(),
            Some("200m")
        );
    }

    #[test]
    fn test_overwrite_reports_unchanged_when_equal() {
        let mut containers = vec![create_test_container("app")];
        apply_preset(&mut containers, &preset(), DefaultingPolicy::AlwaysOverwrite);

        let changed = apply_preset(&mut containers, &preset(), DefaultingPolicy::AlwaysOverwrite);

        assert!(!changed);
    }

    #[test]
    fn test_apply_covers_every_container() {
        let mut sized = create_test_container("sidecar");
        sized.resources = Some(ResourceRequirements {
            requests: Some(BTreeMap::from([(
                RESOURCE_MEMORY.to_string(),
                Quantity("512Mi".to_string()),
            )])),
            ..Default::default()
        });
        let mut containers = vec![create_test_container("app"), sized];

        let changed = apply_preset(&mut containers, &preset(), DefaultingPolicy::FillIfAbsent);

        assert!(changed);
        let app = containers[0].resources.as_ref().unwrap();
        assert_eq!(
            slot(app.requests.as_ref(), RESOURCE_CPU).as_deref(),
            Some("100m")
        );
        let sidecar = containers[1].resources.as_ref().unwrap();
        assert_eq!(
            slot(sidecar.requests.as_ref(), RESOURCE_MEMORY).as_deref(),
            Some("512Mi")
        );
        assert_eq!(
            slot(sidecar.requests.as_ref(), RESOURCE_CPU).as_deref(),
            Some("100m")
        );
    }
}
