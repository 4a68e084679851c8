//! Kubernetes API access for workload replica counts

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use resources_lib::ReplicaSource;
use std::path::Path;

/// Reads ready replicas from the cluster's `apps/v1` API
pub struct KubeReplicaSource {
    client: Client,
}

impl KubeReplicaSource {
    /// Connect with `kubeconfig`, or the inferred configuration when absent
    ///
    /// Inference honours `KUBECONFIG`, `~/.kube/config` and in-cluster
    /// service account credentials.
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context("Invalid kubeconfig")?
            }
            None => Config::infer()
                .await
                .context("Failed to get kubernetes config")?,
        };

        let client = Client::try_from(config).context("Failed to create kubernetes client")?;
        Ok(Self { client })
    }

    /// Namespace of the current kubeconfig context
    pub fn default_namespace(&self) -> &str {
        self.client.default_namespace()
    }
}

#[async_trait]
impl ReplicaSource for KubeReplicaSource {
    async fn ready_replicas(&self, namespace: &str, kind: &str, name: &str) -> Result<i32> {
        match kind {
            "Deployment" => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                let deployment = api.get(name).await?;
                Ok(deployment
                    .status
                    .and_then(|s| s.ready_replicas)
                    .unwrap_or_default())
            }
            "StatefulSet" => {
                let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
                let stateful_set = api.get(name).await?;
                Ok(stateful_set
                    .status
                    .and_then(|s| s.ready_replicas)
                    .unwrap_or_default())
            }
            "DaemonSet" => {
                let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), namespace);
                let daemon_set = api.get(name).await?;
                Ok(daemon_set.status.map(|s| s.number_ready).unwrap_or_default())
            }
            other => bail!("replica lookup not supported for {}", other),
        }
    }
}
