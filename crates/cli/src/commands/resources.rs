//! Resource listing for one Helm release

use anyhow::{Context, Result};
use clap::Args;
use resources_lib::{
    Aggregation, ManifestExtractor, MetricsQuery, NoUsage, PatchLogger, Recommender, UsageSource,
};
use std::path::PathBuf;
use tracing::info;

use crate::cluster::KubeReplicaSource;
use crate::commands::values::patch_values_file;
use crate::config::Settings;
use crate::helm::HelmClient;
use crate::output::{render_recommendations, render_resources, OutputFormat};
use crate::prometheus::PrometheusClient;

/// Flags of the resources command
#[derive(Debug, Clone, Default, Args)]
pub struct ResourcesArgs {
    /// Release name
    pub release: Option<String>,

    /// Namespace of the release
    #[arg(long, short, env = "HELM_NAMESPACE")]
    pub namespace: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Prometheus server URL for usage metrics (e.g. http://prometheus:9090)
    #[arg(long, env = "PROMETHEUS_URL")]
    pub prometheus_url: Option<String>,

    /// Time window for metrics queries (e.g. 5m, 1h, 24h) [default: 5m]
    #[arg(long)]
    pub metrics_window: Option<String>,

    /// Aggregation function for metrics (avg, max) [default: avg]
    #[arg(long)]
    pub aggregation: Option<String>,

    /// Show resource recommendations
    #[arg(long)]
    pub recommend: bool,

    /// Values file to update with the recommendations
    #[arg(long, value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Print the updated values file instead of writing it
    #[arg(long, requires = "values")]
    pub dry_run: bool,
}

/// Options for a resources run, flags already merged with settings
#[derive(Debug, Clone)]
pub struct ResourcesOptions {
    pub release: String,
    pub namespace: Option<String>,
    pub output: OutputFormat,
    pub kubeconfig: Option<PathBuf>,
    pub prometheus_url: Option<String>,
    pub query: MetricsQuery,
    pub recommend: bool,
    pub values: Option<PathBuf>,
    pub values_sections: Option<Vec<String>>,
    pub dry_run: bool,
}

impl ResourcesOptions {
    /// Fill unset flags from `settings`
    pub fn resolve(args: ResourcesArgs, settings: Settings) -> Result<Self> {
        let release = args.release.context("a release name is required")?;
        let aggregation = args.aggregation.unwrap_or(settings.aggregation);

        Ok(Self {
            release,
            namespace: args.namespace.filter(|ns| !ns.is_empty()),
            output: args.output,
            kubeconfig: args.kubeconfig,
            prometheus_url: args
                .prometheus_url
                .or(settings.prometheus_url)
                .filter(|url| !url.is_empty()),
            query: MetricsQuery {
                window: args.metrics_window.unwrap_or(settings.metrics_window),
                aggregation: Aggregation::from_name(&aggregation),
            },
            recommend: args.recommend,
            values: args.values,
            values_sections: settings.values_sections,
            dry_run: args.dry_run,
        })
    }

    /// Recommendations are needed for the table or for patching
    fn wants_recommendations(&self) -> bool {
        self.recommend || self.values.is_some()
    }
}

/// Show resources of a release, then optionally recommend and patch
pub async fn show_resources(options: &ResourcesOptions) -> Result<()> {
    let replicas = KubeReplicaSource::connect(options.kubeconfig.as_deref()).await?;
    let namespace = options
        .namespace
        .clone()
        .unwrap_or_else(|| replicas.default_namespace().to_string());

    let manifest = HelmClient::from_env()
        .with_kubeconfig(options.kubeconfig.as_deref())
        .get_manifest(&options.release, &namespace)
        .await?;

    let prometheus = options
        .prometheus_url
        .as_deref()
        .map(PrometheusClient::new)
        .transpose()
        .context("Failed to create Prometheus client")?;
    let usage: &dyn UsageSource = match &prometheus {
        Some(client) => client,
        None => &NoUsage,
    };

    let resources = ManifestExtractor::new(&options.release, &namespace, &replicas, usage)
        .with_query(options.query.clone())
        .extract(&manifest)
        .await;
    info!(
        release = %options.release,
        namespace = %namespace,
        containers = resources.len(),
        "Extracted release resources"
    );

    // A dry-run patch owns stdout
    let preview = options.values.is_some() && options.dry_run;
    if !preview {
        print!("{}", render_resources(&resources, options.output)?);
    }

    if !options.wants_recommendations() {
        return Ok(());
    }

    let recommendations = Recommender::new().analyze(&resources);
    let logger = PatchLogger::default();
    for rec in &recommendations {
        logger.log_recommendation(rec);
    }

    if options.recommend && !preview {
        print!("{}", render_recommendations(&recommendations));
    }

    if let Some(values) = &options.values {
        patch_values_file(
            values,
            &recommendations,
            options.values_sections.as_deref(),
            options.dry_run,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ResourcesArgs {
        ResourcesArgs {
            release: Some("backend".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            prometheus_url: Some("http://prometheus:9090".to_string()),
            metrics_window: "1h".to_string(),
            aggregation: "max".to_string(),
            values_sections: None,
        };
        let args = ResourcesArgs {
            namespace: Some("apps".to_string()),
            prometheus_url: Some("http://other:9090".to_string()),
            aggregation: Some("avg".to_string()),
            ..args()
        };

        let options = ResourcesOptions::resolve(args, settings).unwrap();
        assert_eq!(options.release, "backend");
        assert_eq!(options.namespace.as_deref(), Some("apps"));
        assert_eq!(options.prometheus_url.as_deref(), Some("http://other:9090"));
        assert_eq!(options.query.window, "1h");
        assert_eq!(options.query.aggregation, Aggregation::Avg);
    }

    #[test]
    fn test_settings_fill_unset_flags() {
        let settings = Settings {
            prometheus_url: Some("http://prometheus:9090".to_string()),
            aggregation: "max".to_string(),
            ..Settings::default()
        };
        let args = ResourcesArgs {
            namespace: Some(String::new()),
            ..args()
        };

        let options = ResourcesOptions::resolve(args, settings).unwrap();
        assert_eq!(options.namespace, None);
        assert_eq!(options.prometheus_url.as_deref(), Some("http://prometheus:9090"));
        assert_eq!(options.query.window, "5m");
        assert_eq!(options.query.aggregation, Aggregation::Max);
    }

    #[test]
    fn test_unknown_aggregation_falls_back_to_avg() {
        let args = ResourcesArgs {
            prometheus_url: Some(String::new()),
            aggregation: Some("p95".to_string()),
            ..args()
        };

        let options = ResourcesOptions::resolve(args, Settings::default()).unwrap();
        assert_eq!(options.query.aggregation, Aggregation::Avg);
        assert_eq!(options.prometheus_url, None);
        assert!(!options.wants_recommendations());
    }

    #[test]
    fn test_release_is_required() {
        let err = ResourcesOptions::resolve(ResourcesArgs::default(), Settings::default())
            .unwrap_err();
        assert!(err.to_string().contains("release name is required"));
    }
}
