//! Cluster-facing collaborators used while reading a release
//!
//! Replica counts come from the Kubernetes API and usage from a metrics
//! backend. Both sit behind traits so extraction can run against fakes.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Aggregation applied over the metrics window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregation {
    #[default]
    Avg,
    Max,
}

impl Aggregation {
    /// Parse an aggregation name, falling back to `avg` for anything unknown
    pub fn from_name(name: &str) -> Self {
        match name {
            "max" => Aggregation::Max,
            _ => Aggregation::Avg,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Avg => "avg",
            Aggregation::Max => "max",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window and aggregation for usage queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsQuery {
    /// Range selector such as `5m` or `1h`
    pub window: String,
    pub aggregation: Aggregation,
}

impl Default for MetricsQuery {
    fn default() -> Self {
        Self {
            window: "5m".to_string(),
            aggregation: Aggregation::Avg,
        }
    }
}

/// Observed usage of one container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerUsage {
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
}

/// Source of ready replica counts for workloads
#[async_trait]
pub trait ReplicaSource: Send + Sync {
    /// Ready replicas of `kind`/`name` (ready pods for DaemonSets)
    async fn ready_replicas(&self, namespace: &str, kind: &str, name: &str) -> Result<i32>;
}

/// Source of container usage metrics
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Usage of `container` in pods whose name starts with `pod_prefix`
    async fn container_usage(
        &self,
        namespace: &str,
        pod_prefix: &str,
        container: &str,
        query: &MetricsQuery,
    ) -> Result<ContainerUsage>;
}

/// Usage source for runs without a metrics backend
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUsage;

#[async_trait]
impl UsageSource for NoUsage {
    async fn container_usage(
        &self,
        _namespace: &str,
        _pod_prefix: &str,
        _container: &str,
        _query: &MetricsQuery,
    ) -> Result<ContainerUsage> {
        Ok(ContainerUsage::default())
    }
}
