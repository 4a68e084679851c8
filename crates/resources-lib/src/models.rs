//! Core data models for workload resources and recommendations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Replica count placeholder used when the cluster cannot be queried
pub const UNKNOWN_REPLICAS: &str = "unknown";

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Requests, limits and observed usage of one container in a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub release: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub replicas: String,
    pub container: String,
    /// millicores
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cpu_request: i64,
    /// millicores
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cpu_limit: i64,
    /// bytes
    #[serde(default, rename = "memory_request", skip_serializing_if = "is_zero")]
    pub mem_request: i64,
    /// bytes
    #[serde(default, rename = "memory_limit", skip_serializing_if = "is_zero")]
    pub mem_limit: i64,
    /// millicores
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cpu_usage: i64,
    /// bytes
    #[serde(default, rename = "memory_usage", skip_serializing_if = "is_zero")]
    pub mem_usage: i64,
}

/// Recommended requests and limits for one container
///
/// CPU values are millicores, memory values are bytes. `name` is the
/// fully-qualified workload name, usually `<release>-<workload>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecommendation {
    pub release: String,
    pub kind: String,
    pub name: String,
    pub container: String,
    pub cpu_usage: i64,
    pub mem_usage: i64,
    pub current_cpu_request: i64,
    pub recommended_cpu_request: i64,
    pub current_mem_request: i64,
    pub recommended_mem_request: i64,
    pub current_cpu_limit: i64,
    pub recommended_cpu_limit: i64,
    pub current_mem_limit: i64,
    pub recommended_mem_limit: i64,
}

impl ResourceRecommendation {
    /// Workload key as it appears in a values file
    ///
    /// Strips a leading `<release>-` from the workload name.
    pub fn workload_key(&self) -> &str {
        self.name
            .strip_prefix(&self.release)
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(&self.name)
    }
}

/// One editable location in a values file
///
/// An empty `container` means the workload's own `resources` block rather
/// than an entry of its `containers` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadPath {
    pub section: String,
    pub workload: String,
    #[serde(default)]
    pub container: String,
}

impl WorkloadPath {
    pub fn new(
        section: impl Into<String>,
        workload: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            section: section.into(),
            workload: workload.into(),
            container: container.into(),
        }
    }

    /// Returns true if this path addresses an entry of a `containers` list
    pub fn has_container(&self) -> bool {
        !self.container.is_empty()
    }
}

impl fmt::Display for WorkloadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.section, self.workload, self.container)
    }
}
