//! Resource extraction from a rendered release manifest
//!
//! The manifest is split into YAML documents. `apps/v1` workloads are read
//! through the typed Kubernetes API structs; a few operator custom resources
//! (CloudNativePG, Altinity ClickHouse) are read from the generic tree.

mod crd;
mod workloads;


use crate::models::{ResourceInfo, UNKNOWN_REPLICAS};
use crate::quantity::{parse_cpu_millis, parse_memory_bytes};
use crate::sources::{MetricsQuery, ReplicaSource, UsageSource};
use serde_yaml::Value;
use tracing::debug;

/// Reads container resources of one release, enriched with cluster data
pub struct ManifestExtractor<'a> {
    release: String,
    namespace: String,
    replicas: &'a dyn ReplicaSource,
    usage: &'a dyn UsageSource,
    query: MetricsQuery,
}

impl<'a> ManifestExtractor<'a> {
    pub fn new(
        release: impl Into<String>,
        namespace: impl Into<String>,
        replicas: &'a dyn ReplicaSource,
        usage: &'a dyn UsageSource,
    ) -> Self {
        Self {
            release: release.into(),
            namespace: namespace.into(),
            replicas,
            usage,
            query: MetricsQuery::default(),
        }
    }

    pub fn with_query(mut self, query: MetricsQuery) -> Self {
        self.query = query;
        self
    }

    /// One record per container of every supported object in `manifest`
    ///
    /// Documents that fail to decode or describe other kinds are skipped.
    pub async fn extract(&self, manifest: &str) -> Vec<ResourceInfo> {
        let mut resources = Vec::new();

        for doc in split_documents(manifest) {
            let value: Value = match serde_yaml::from_str(doc) {
                Ok(value) => value,
                Err(err) => {
                    debug!(error = %err, "Skipping undecodable manifest document");
                    continue;
                }
            };

            let api_version = value
                .get("apiVersion")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let kind = value.get("kind").and_then(Value::as_str).unwrap_or_default();

            let extracted = match (api_version, kind) {
                (workloads::APPS_V1, workloads::DEPLOYMENT)
                | (workloads::APPS_V1, workloads::STATEFUL_SET)
                | (workloads::APPS_V1, workloads::DAEMON_SET) => {
                    workloads::extract(self, kind, &value).await
                }
                (crd::CNPG_V1, crd::CNPG_CLUSTER) => crd::extract_cnpg_cluster(self, &value).await,
                (crd::CNPG_V1, crd::CNPG_POOLER) => crd::extract_cnpg_pooler(self, &value).await,
                (crd::CLICKHOUSE_V1, crd::CLICKHOUSE_INSTALLATION) => {
                    crd::extract_clickhouse_installation(self, &value).await
                }
                _ => continue,
            };

            resources.extend(extracted);
        }

        resources
    }

    fn record(&self, kind: &str, name: &str, replicas: String, container: &str) -> ResourceInfo {
        ResourceInfo {
            release: self.release.clone(),
            kind: kind.to_string(),
            name: name.to_string(),
            replicas,
            container: container.to_string(),
            ..Default::default()
        }
    }

    /// Ready replicas as text, `unknown` when the lookup fails
    async fn replicas(&self, kind: &str, name: &str) -> String {
        match self.replicas.ready_replicas(&self.namespace, kind, name).await {
            Ok(count) => count.to_string(),
            Err(err) => {
                debug!(kind = %kind, name = %name, error = %err, "Replica lookup failed");
                UNKNOWN_REPLICAS.to_string()
            }
        }
    }

    /// Fill usage fields from the usage source; failures leave them at zero
    async fn attach_usage(&self, info: &mut ResourceInfo, pod_prefix: &str) {
        match self
            .usage
            .container_usage(&self.namespace, pod_prefix, &info.container, &self.query)
            .await
        {
            Ok(usage) => {
                info.cpu_usage = usage.cpu_millicores;
                info.mem_usage = usage.memory_bytes;
            }
            Err(err) => {
                debug!(
                    pod_prefix = %pod_prefix,
                    container = %info.container,
                    error = %err,
                    "Usage lookup failed"
                );
            }
        }
    }
}

/// Split a multi-document manifest on `---` separator lines
pub fn split_documents(manifest: &str) -> Vec<&str> {
    let mut docs = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in manifest.split_inclusive('\n') {
        let content = line.trim_end();
        if content == "---" || content.starts_with("--- ") {
            docs.push(&manifest[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    docs.push(&manifest[start..]);

    docs.into_iter().filter(|doc| !doc.trim().is_empty()).collect()
}

/// Read `requests`/`limits` of a generic `resources` mapping into `info`
///
/// Unparseable quantities are left at zero.
fn apply_resources_value(resources: &Value, info: &mut ResourceInfo) {
    let quantity = |section: &str, key: &str| {
        resources
            .get(section)
            .and_then(|s| s.get(key))
            .and_then(scalar_string)
    };

    if let Some(cpu) = quantity("requests", "cpu") {
        info.cpu_request = parse_or_zero(&cpu, parse_cpu_millis);
    }
    if let Some(memory) = quantity("requests", "memory") {
        info.mem_request = parse_or_zero(&memory, parse_memory_bytes);
    }
    if let Some(cpu) = quantity("limits", "cpu") {
        info.cpu_limit = parse_or_zero(&cpu, parse_cpu_millis);
    }
    if let Some(memory) = quantity("limits", "memory") {
        info.mem_limit = parse_or_zero(&memory, parse_memory_bytes);
    }
}

fn parse_or_zero<E: std::fmt::Display>(raw: &str, parse: fn(&str) -> Result<i64, E>) -> i64 {
    match parse(raw) {
        Ok(value) => value,
        Err(err) => {
            debug!(quantity = %raw, error = %err, "Ignoring invalid quantity");
            0
        }
    }
}

/// String form of a scalar YAML value (`1`, `500m`, `1.5`)
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Follow a chain of mapping keys
fn nested<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}
