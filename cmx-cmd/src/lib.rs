//! Command implementations for the CMX CLI.
//!
//! Provides subcommands for listing what the comparison backend offers,
//! rendering a single map view, and an interactive exploration loop.

use clap::{Args, Subcommand, ValueEnum};
use cmx_core::client::{BackendClient, BackendConfig};
use cmx_core::PhysicalVariable;
use cmx_session::VisualizationMode;
use std::time::Duration;

pub mod explore;
pub mod query;

/// Where to find the backend.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Base URL of the comparison results backend
    #[arg(long, env = "CMX_API_URL", default_value = BackendConfig::DEFAULT_URL, global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "CMX_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,
}

impl BackendArgs {
    pub fn config(&self) -> BackendConfig {
        BackendConfig::new(self.api_url.clone(), Duration::from_secs(self.timeout_secs))
    }

    pub fn client(&self) -> anyhow::Result<BackendClient> {
        Ok(BackendClient::new(self.config())?)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Full map view as JSON
    Json,
    /// One row per marker
    Csv,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every region the backend has results for
    Regions,

    /// List the metrics available for a physical variable
    Metrics {
        /// Physical variable (ppt or tas)
        #[arg(short = 'v', long)]
        variable: PhysicalVariable,
    },

    /// Load one selection and write the resulting map view
    Render {
        /// Physical variable (ppt or tas)
        #[arg(short = 'v', long)]
        variable: PhysicalVariable,

        /// Comparison metric, as listed by `metrics`
        #[arg(short = 'm', long)]
        metric: String,

        /// Restrict to one region
        #[arg(short = 'r', long)]
        region: Option<String>,

        /// Visualization mode
        #[arg(long, default_value = "interaction")]
        mode: VisualizationMode,

        /// Model to highlight in gcm_filter or rcm_filter mode
        #[arg(long)]
        filter: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output path; stdout when omitted
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Interactive session reading selection commands from stdin
    Explore,
}

pub async fn run(backend: BackendArgs, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Regions => query::run_regions(&backend).await,
        Command::Metrics { variable } => query::run_metrics(&backend, variable).await,
        Command::Render {
            variable,
            metric,
            region,
            mode,
            filter,
            format,
            output,
        } => {
            let selection = query::Selection {
                variable,
                metric,
                region,
                mode,
                filter,
            };
            query::run_render(&backend, &selection, format, output.as_deref()).await
        }
        Command::Explore => explore::run_explore(&backend).await,
    }
}
