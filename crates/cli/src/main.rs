//! Helm Resources CLI
//!
//! Shows resource requests, limits and usage of the workloads in a Helm
//! release, recommends new values and writes them into a values file.

mod cluster;
mod commands;
mod config;
mod helm;
mod output;
mod prometheus;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::resources::{self, ResourcesArgs, ResourcesOptions};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LONG_ABOUT: &str = "\
Show resource requests and limits for all workloads in a helm release.

This command analyzes a deployed helm release and displays the CPU and memory
requests and limits for all deployments, statefulsets, and daemonsets managed
by the release, along with supported operator resources.";

/// Helm Resources CLI
#[derive(Parser)]
#[command(name = "helm-resources")]
#[command(author, version, about = "Show workload resources of a helm release")]
#[command(long_about = LONG_ABOUT)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub resources: ResourcesArgs,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log format on stderr
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the plugin version
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so table/JSON/YAML output stays parseable
    let default_level = if cli.verbose { "info" } else { "warn" };
    let (text_layer, json_layer) = match cli.log_format {
        LogFormat::Text => (Some(fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(text_layer)
        .with(json_layer)
        .init();

    match cli.command {
        Some(Commands::Version) => {
            println!("helm-resources {}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            let settings = config::Settings::load()?;
            let options = ResourcesOptions::resolve(cli.resources, settings)?;
            resources::show_resources(&options).await?;
        }
    }

    Ok(())
}
