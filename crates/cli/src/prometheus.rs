//! Prometheus client for container usage metrics

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use resources_lib::{ContainerUsage, MetricsQuery, UsageSource};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Instant-query client for the Prometheus HTTP API
pub struct PrometheusClient {
    client: Client,
    base_url: Url,
}

impl PrometheusClient {
    /// Create a new Prometheus client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(base_url).context("Invalid Prometheus URL")?;
        // Keep a path prefix such as `/prometheus` when joining
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Evaluate `query` now and return the first sample of the result vector
    ///
    /// An empty vector yields `None`.
    pub async fn query_scalar(&self, query: &str) -> Result<Option<f64>> {
        let url = self.base_url.join("api/v1/query").context("Invalid path")?;
        let time = chrono::Utc::now().timestamp().to_string();

        let response = self
            .client
            .get(url)
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Prometheus error ({}): {}", status, body);
        }

        let body: QueryResponse = response.json().await.context("Failed to parse response")?;
        if body.status != "success" {
            anyhow::bail!(
                "Prometheus query failed: {}",
                body.error.unwrap_or_else(|| body.status.clone())
            );
        }

        let Some(data) = body.data else {
            return Ok(None);
        };
        if data.result_type != "vector" {
            return Ok(None);
        }

        match data.result.first() {
            Some(sample) => {
                let value = sample
                    .value
                    .1
                    .parse::<f64>()
                    .with_context(|| format!("Invalid sample value {:?}", sample.value.1))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UsageSource for PrometheusClient {
    async fn container_usage(
        &self,
        namespace: &str,
        pod_prefix: &str,
        container: &str,
        query: &MetricsQuery,
    ) -> Result<ContainerUsage> {
        let cpu_query = cpu_usage_query(namespace, pod_prefix, container, query);
        let cpu = self.query_scalar(&cpu_query).await?;

        let memory_query = memory_usage_query(namespace, pod_prefix, container, query);
        let memory = self.query_scalar(&memory_query).await?;

        debug!(
            pod_prefix = %pod_prefix,
            container = %container,
            cpu = ?cpu,
            memory = ?memory,
            "Fetched container usage"
        );

        Ok(ContainerUsage {
            cpu_millicores: cpu.map(|v| v as i64).unwrap_or_default(),
            memory_bytes: memory.map(|v| v as i64).unwrap_or_default(),
        })
    }
}

/// CPU usage in millicores
pub fn cpu_usage_query(
    namespace: &str,
    pod_prefix: &str,
    container: &str,
    query: &MetricsQuery,
) -> String {
    format!(
        r#"{}(rate(container_cpu_usage_seconds_total{{namespace="{}",pod=~"{}.*",container="{}"}}[{}])) * 1000"#,
        query.aggregation, namespace, pod_prefix, container, query.window
    )
}

/// Working set memory in bytes
pub fn memory_usage_query(
    namespace: &str,
    pod_prefix: &str,
    container: &str,
    query: &MetricsQuery,
) -> String {
    format!(
        r#"{}(container_memory_usage_bytes{{namespace="{}",pod=~"{}.*",container="{}"}}[{}])"#,
        query.aggregation, namespace, pod_prefix, container, query.window
    )
}

// API response types

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    #[serde(default)]
    result: Vec<VectorSample>,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    /// `[<unix time>, "<value>"]`
    value: (f64, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use resources_lib::Aggregation;

    fn vector_body(value: &str) -> String {
        format!(
            r#"{{"status":"success","data":{{"resultType":"vector","result":[{{"metric":{{}},"value":[1717000000.5,"{}"]}}]}}}}"#,
            value
        )
    }

    #[test]
    fn test_queries() {
        let query = MetricsQuery {
            window: "1h".to_string(),
            aggregation: Aggregation::Max,
        };

        assert_eq!(
            cpu_usage_query("apps", "backend-api", "api", &query),
            r#"max(rate(container_cpu_usage_seconds_total{namespace="apps",pod=~"backend-api.*",container="api"}[1h])) * 1000"#
        );
        assert_eq!(
            memory_usage_query("apps", "backend-api", "api", &MetricsQuery::default()),
            r#"avg(container_memory_usage_bytes{namespace="apps",pod=~"backend-api.*",container="api"}[5m])"#
        );
    }

    #[tokio::test]
    async fn test_container_usage() {
        let mut server = mockito::Server::new_async().await;
        let query = MetricsQuery::default();

        let cpu = server
            .mock("GET", "/api/v1/query")
            .match_query(Matcher::UrlEncoded(
                "query".into(),
                cpu_usage_query("apps", "backend-api", "api", &query),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(vector_body("312.7"))
            .create_async()
            .await;
        let memory = server
            .mock("GET", "/api/v1/query")
            .match_query(Matcher::UrlEncoded(
                "query".into(),
                memory_usage_query("apps", "backend-api", "api", &query),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(vector_body("268435456"))
            .create_async()
            .await;

        let client = PrometheusClient::new(&server.url()).unwrap();
        let usage = client
            .container_usage("apps", "backend-api", "api", &query)
            .await
            .unwrap();

        assert_eq!(usage.cpu_millicores, 312);
        assert_eq!(usage.memory_bytes, 268435456);
        cpu.assert_async().await;
        memory.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_vector_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#)
            .create_async()
            .await;

        let client = PrometheusClient::new(&server.url()).unwrap();
        assert_eq!(client.query_scalar("up").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = PrometheusClient::new(&server.url()).unwrap();
        let err = client.query_scalar("up").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
