//! Operator custom resources that run containers on behalf of a release

use super::{apply_resources_value, nested, ManifestExtractor};
use crate::models::{ResourceInfo, UNKNOWN_REPLICAS};
use serde_yaml::Value;

pub const CNPG_V1: &str = "postgresql.cnpg.io/v1";
pub const CNPG_CLUSTER: &str = "Cluster";
pub const CNPG_POOLER: &str = "Pooler";

pub const CLICKHOUSE_V1: &str = "clickhouse.altinity.com/v1";
pub const CLICKHOUSE_INSTALLATION: &str = "ClickHouseInstallation";

const POSTGRES_CONTAINER: &str = "postgres";
const PGBOUNCER_CONTAINER: &str = "pgbouncer";
const CLICKHOUSE_CONTAINER: &str = "clickhouse";

/// CloudNativePG `Cluster`: one `postgres` record sized by `spec.resources`
pub(super) async fn extract_cnpg_cluster(
    extractor: &ManifestExtractor<'_>,
    value: &Value,
) -> Vec<ResourceInfo> {
    let name = object_name(value);
    let mut info = extractor.record(
        CNPG_CLUSTER,
        &name,
        instances(value),
        POSTGRES_CONTAINER,
    );

    if let Some(resources) = nested(value, &["spec", "resources"]) {
        apply_resources_value(resources, &mut info);
    }

    extractor.attach_usage(&mut info, &name).await;
    vec![info]
}

/// CloudNativePG `Pooler`: the first template container is pgbouncer
pub(super) async fn extract_cnpg_pooler(
    extractor: &ManifestExtractor<'_>,
    value: &Value,
) -> Vec<ResourceInfo> {
    let name = object_name(value);
    let mut info = extractor.record(CNPG_POOLER, &name, instances(value), PGBOUNCER_CONTAINER);

    let first_container = nested(value, &["spec", "template", "spec", "containers"])
        .and_then(Value::as_sequence)
        .and_then(|containers| containers.first());
    if let Some(resources) = first_container.and_then(|c| c.get("resources")) {
        apply_resources_value(resources, &mut info);
    }

    extractor.attach_usage(&mut info, &name).await;
    vec![info]
}

/// Altinity `ClickHouseInstallation`
///
/// Replicas are the sum of `shardsCount * replicasCount` over all clusters.
/// Pods are named `chi-<installation>-<cluster>-...`, where the cluster is
/// the last one declared without a complete layout (the installation name
/// otherwise).
pub(super) async fn extract_clickhouse_installation(
    extractor: &ManifestExtractor<'_>,
    value: &Value,
) -> Vec<ResourceInfo> {
    let name = object_name(value);
    let mut cluster_name = name.clone();
    let mut total_replicas: i64 = 0;

    let clusters = nested(value, &["spec", "configuration", "clusters"])
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for cluster in clusters {
        let shards = nested(cluster, &["layout", "shardsCount"]).and_then(Value::as_i64);
        let replicas = nested(cluster, &["layout", "replicasCount"]).and_then(Value::as_i64);

        match (shards, replicas) {
            (Some(shards), Some(replicas)) => total_replicas += shards * replicas,
            _ => {
                if let Some(declared) = cluster.get("name").and_then(Value::as_str) {
                    cluster_name = declared.to_string();
                }
            }
        }
    }

    let replicas = if total_replicas > 0 {
        total_replicas.to_string()
    } else {
        UNKNOWN_REPLICAS.to_string()
    };

    let mut info = extractor.record(
        CLICKHOUSE_INSTALLATION,
        &name,
        replicas,
        CLICKHOUSE_CONTAINER,
    );

    let clickhouse = nested(value, &["spec", "templates", "podTemplates"])
        .and_then(Value::as_sequence)
        .and_then(|templates| templates.first())
        .and_then(|template| nested(template, &["spec", "containers"]))
        .and_then(Value::as_sequence)
        .and_then(|containers| {
            containers
                .iter()
                .find(|c| c.get("name").and_then(Value::as_str) == Some(CLICKHOUSE_CONTAINER))
        });
    if let Some(resources) = clickhouse.and_then(|c| c.get("resources")) {
        apply_resources_value(resources, &mut info);
    }

    let pod_prefix = format!("chi-{}-{}", name, cluster_name);
    extractor.attach_usage(&mut info, &pod_prefix).await;
    vec![info]
}

fn object_name(value: &Value) -> String {
    nested(value, &["metadata", "name"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `spec.instances` as text, `unknown` when absent
fn instances(value: &Value) -> String {
    nested(value, &["spec", "instances"])
        .and_then(Value::as_i64)
        .map(|count| count.to_string())
        .unwrap_or_else(|| UNKNOWN_REPLICAS.to_string())
}
