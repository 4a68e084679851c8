//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use resources_lib::quantity::format_resource_values;
use resources_lib::{ResourceInfo, ResourceRecommendation};
use tabled::{settings::Style, Table, Tabled};

/// Output format for the resource listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Row for the resources table
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "REPLICAS")]
    replicas: String,
    #[tabled(rename = "CONTAINER")]
    container: String,
    #[tabled(rename = "REQUESTS (CPU/MEM)")]
    requests: String,
    #[tabled(rename = "LIMITS (CPU/MEM)")]
    limits: String,
    #[tabled(rename = "USAGE (CPU/MEM)")]
    usage: String,
}

/// Row for the recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CONTAINER")]
    container: String,
    #[tabled(rename = "REQUESTS (CPU/MEM)")]
    requests: String,
    #[tabled(rename = "LIMITS (CPU/MEM)")]
    limits: String,
    #[tabled(rename = "CURRENT (CPU/MEM)")]
    current: String,
}

/// Render the resource listing in `format`
pub fn render_resources(resources: &[ResourceInfo], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(resources)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(resources)?),
        OutputFormat::Table => {
            let rows = resources.iter().map(|r| ResourceRow {
                kind: r.kind.clone(),
                name: r.name.clone(),
                replicas: r.replicas.clone(),
                container: r.container.clone(),
                requests: format_resource_values(r.cpu_request, r.mem_request),
                limits: format_resource_values(r.cpu_limit, r.mem_limit),
                usage: format_resource_values(r.cpu_usage, r.mem_usage),
            });

            let table = Table::new(rows).with(Style::blank()).to_string();
            Ok(format!("\nRESOURCES:\n\n{}\n", table))
        }
    }
}

/// Render the recommendations table, empty when there is nothing to show
pub fn render_recommendations(recommendations: &[ResourceRecommendation]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let rows = recommendations.iter().map(|r| RecommendationRow {
        kind: r.kind.clone(),
        name: r.name.clone(),
        container: r.container.clone(),
        requests: format_resource_values(r.recommended_cpu_request, r.recommended_mem_request),
        limits: format_resource_values(r.recommended_cpu_limit, r.recommended_mem_limit),
        current: format_resource_values(r.cpu_usage, r.mem_usage),
    });

    let table = Table::new(rows).with(Style::blank()).to_string();
    format!("\nRESOURCE RECOMMENDATIONS:\n\n{}\n", table)
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}
