//! Test utilities for unit testing reconcilers
//!
//! Builders for the workloads and presets that strategy tests seed into
//! the mock store, plus small accessors for asserting on resource slots.

#[cfg(test)]
use crate::resolver::PRESET_LABEL;
#[cfg(test)]
use crds::{ResourcePreset, ResourcePresetSpec};
#[cfg(test)]
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
#[cfg(test)]
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodTemplateSpec};
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use std::collections::BTreeMap;

/// Creates a preset spec from the four quantity strings
#[cfg(test)]
pub fn create_test_preset_spec(
    cpu_requests: &str,
    cpu_limits: &str,
    memory_requests: &str,
    memory_limits: &str,
) -> ResourcePresetSpec {
    ResourcePresetSpec {
        cpu_requests: Quantity(cpu_requests.to_string()),
        cpu_limits: Quantity(cpu_limits.to_string()),
        memory_requests: Quantity(memory_requests.to_string()),
        memory_limits: Quantity(memory_limits.to_string()),
    }
}

/// Creates a named ResourcePreset in a namespace
#[cfg(test)]
pub fn create_test_preset(name: &str, namespace: &str, spec: ResourcePresetSpec) -> ResourcePreset {
    ResourcePreset {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec,
    }
}

/// Creates a container with no resources block
#[cfg(test)]
pub fn create_test_container(name: &str) -> Container {
    Container {
        name: name.to_string(),
        image: Some("nginx:latest".to_string()),
        ..Default::default()
    }
}

/// Labels carrying the preset reference when one is given
#[cfg(test)]
fn test_labels(preset: Option<&str>) -> Option<BTreeMap<String, String>> {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "web".to_string());
    if let Some(preset) = preset {
        labels.insert(PRESET_LABEL.to_string(), preset.to_string());
    }
    Some(labels)
}

/// Creates a Deployment whose pod template holds the given containers
#[cfg(test)]
pub fn create_test_deployment(
    name: &str,
    namespace: &str,
    preset: Option<&str>,
    containers: Vec<Container>,
) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: test_labels(preset),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    containers,
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// Creates a Pod holding the given containers
#[cfg(test)]
pub fn create_test_pod(
    name: &str,
    namespace: &str,
    preset: Option<&str>,
    containers: Vec<Container>,
) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: test_labels(preset),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers,
            ..Default::default()
        }),
        status: None,
    }
}

/// Containers of a Deployment's pod template
#[cfg(test)]
pub fn template_containers(deployment: &Deployment) -> &[Container] {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod_spec| pod_spec.containers.as_slice())
        .unwrap_or(&[])
}

/// Containers of a Pod
#[cfg(test)]
pub fn pod_containers(pod: &Pod) -> &[Container] {
    pod.spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or(&[])
}

/// Request quantity at a key of a container, if set
#[cfg(test)]
pub fn request_of(container: &Container, key: &str) -> Option<String> {
    container
        .resources
        .as_ref()
        .and_then(|resources| resources.requests.as_ref())
        .and_then(|requests| requests.get(key))
        .map(|quantity| quantity.0.clone())
}

/// Limit quantity at a key of a container, if set
#[cfg(test)]
pub fn limit_of(container: &Container, key: &str) -> Option<String> {
    container
        .resources
        .as_ref()
        .and_then(|resources| resources.limits.as_ref())
        .and_then(|limits| limits.get(key))
        .map(|quantity| quantity.0.clone())
}
