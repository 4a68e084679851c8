//! `apps/v1` Deployments, StatefulSets and DaemonSets

use super::{parse_or_zero, ManifestExtractor};
use crate::models::ResourceInfo;
use crate::quantity::{parse_cpu_millis, parse_memory_bytes};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};
use serde_yaml::Value;
use tracing::debug;

pub const APPS_V1: &str = "apps/v1";
pub const DEPLOYMENT: &str = "Deployment";
pub const STATEFUL_SET: &str = "StatefulSet";
pub const DAEMON_SET: &str = "DaemonSet";

/// One record per pod template container of an `apps/v1` workload
pub(super) async fn extract(
    extractor: &ManifestExtractor<'_>,
    kind: &str,
    value: &Value,
) -> Vec<ResourceInfo> {
    let Some((name, template)) = decode(kind, value) else {
        return Vec::new();
    };

    let containers = template.spec.map(|spec| spec.containers).unwrap_or_default();
    if containers.is_empty() {
        return Vec::new();
    }

    let replicas = extractor.replicas(kind, &name).await;
    let mut resources = Vec::with_capacity(containers.len());

    for container in &containers {
        let mut info = extractor.record(kind, &name, replicas.clone(), &container.name);
        apply_container_resources(container, &mut info);
        extractor.attach_usage(&mut info, &name).await;
        resources.push(info);
    }

    resources
}

/// Name and pod template of a workload document
fn decode(kind: &str, value: &Value) -> Option<(String, PodTemplateSpec)> {
    let mut value = value.clone();
    quote_quantities(&mut value);

    let decoded = match kind {
        DEPLOYMENT => serde_yaml::from_value::<Deployment>(value)
            .map(|d| (d.metadata.name, d.spec.map(|s| s.template))),
        STATEFUL_SET => serde_yaml::from_value::<StatefulSet>(value)
            .map(|s| (s.metadata.name, s.spec.map(|s| s.template))),
        DAEMON_SET => serde_yaml::from_value::<DaemonSet>(value)
            .map(|d| (d.metadata.name, d.spec.map(|s| s.template))),
        _ => return None,
    };

    match decoded {
        Ok((Some(name), Some(template))) => Some((name, template)),
        Ok(_) => None,
        Err(err) => {
            debug!(kind = %kind, error = %err, "Skipping workload that does not decode");
            None
        }
    }
}

/// Rewrite bare numeric quantities (`cpu: 1`) as strings
///
/// Rendered charts often leave them unquoted, and `Quantity` only decodes
/// from a string.
fn quote_quantities(value: &mut Value) {
    let Some(containers) = value
        .get_mut("spec")
        .and_then(|v| v.get_mut("template"))
        .and_then(|v| v.get_mut("spec"))
        .and_then(|v| v.get_mut("containers"))
        .and_then(Value::as_sequence_mut)
    else {
        return;
    };

    for container in containers {
        let Some(resources) = container.get_mut("resources") else {
            continue;
        };
        for section in ["requests", "limits"] {
            let Some(quantities) = resources.get_mut(section).and_then(Value::as_mapping_mut)
            else {
                continue;
            };
            for (_, quantity) in quantities.iter_mut() {
                if let Value::Number(n) = quantity {
                    *quantity = Value::String(n.to_string());
                }
            }
        }
    }
}

fn apply_container_resources(container: &Container, info: &mut ResourceInfo) {
    let Some(resources) = &container.resources else {
        return;
    };

    if let Some(requests) = &resources.requests {
        if let Some(cpu) = requests.get("cpu") {
            info.cpu_request = parse_or_zero(&cpu.0, parse_cpu_millis);
        }
        if let Some(memory) = requests.get("memory") {
            info.mem_request = parse_or_zero(&memory.0, parse_memory_bytes);
        }
    }

    if let Some(limits) = &resources.limits {
        if let Some(cpu) = limits.get("cpu") {
            info.cpu_limit = parse_or_zero(&cpu.0, parse_cpu_millis);
        }
        if let Some(memory) = limits.get("memory") {
            info.mem_limit = parse_or_zero(&memory.0, parse_memory_bytes);
        }
    }
}
