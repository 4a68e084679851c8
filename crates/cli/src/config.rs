//! Configuration management for the CLI
//!
//! Defaults come from `~/.config/helm-resources/config.json` and
//! `HELM_RESOURCES_*` environment variables. Command line flags win over
//! both.

use anyhow::{Context, Result};
use resources_lib::{Aggregation, MetricsQuery};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "HELM_RESOURCES";

/// Persistent CLI settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Prometheus server used for usage metrics
    #[serde(default)]
    pub prometheus_url: Option<String>,

    /// Range selector for usage queries
    #[serde(default = "default_metrics_window")]
    pub metrics_window: String,

    /// `avg` or `max`
    #[serde(default = "default_aggregation")]
    pub aggregation: String,

    /// Top-level values sections that hold workloads
    #[serde(default)]
    pub values_sections: Option<Vec<String>>,
}

fn default_metrics_window() -> String {
    MetricsQuery::default().window
}

fn default_aggregation() -> String {
    Aggregation::default().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prometheus_url: None,
            metrics_window: default_metrics_window(),
            aggregation: default_aggregation(),
            values_sections: None,
        }
    }
}

impl Settings {
    /// Load settings from the default file and the environment
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::load_sources(None),
        }
    }

    /// Load settings from `path` (if it exists) and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_sources(Some(path))
    }

    fn load_sources(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read settings")?;

        config
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| {
            home.join(".config")
                .join("helm-resources")
                .join("config.json")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(settings.metrics_window, "5m");
        assert_eq!(settings.aggregation, "avg");
        assert!(settings.values_sections.is_none());
    }

    #[test]
    fn test_reads_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
  "prometheus_url": "http://prometheus:9090",
  "metrics_window": "1h",
  "aggregation": "max",
  "values_sections": ["services", "workers", "jobs"]
}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(
            settings.prometheus_url.as_deref(),
            Some("http://prometheus:9090")
        );
        assert_eq!(settings.metrics_window, "1h");
        assert_eq!(settings.aggregation, "max");
        assert_eq!(settings.values_sections.unwrap().len(), 3);
    }
}
