//! CLI runner - executes commands

use crate::auth::resolve_credentials;
use crate::cli::commands::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::pipeline::{self, RunSummary};
use crate::source::FeatureServiceSource;
use crate::transform::batch_to_rows;
use crate::types::LogLevel;
use crate::warehouse::{BigQueryClient, TableRef};
use serde_json::json;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Log level requested by the flags, falling back to the config file
    pub fn log_level(&self, config: &PipelineConfig) -> LogLevel {
        if self.cli.verbose {
            LogLevel::Debug
        } else {
            config.log_level
        }
    }

    /// Build the effective configuration: file, then flag overrides, then validation
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        let cli = &self.cli;
        if let Some(url) = &cli.source_url {
            config.source.url.clone_from(url);
        }
        if let Some(page_size) = cli.page_size {
            config.source.page_size = Some(page_size);
        }
        if let Some(project) = &cli.project {
            config.destination.project_id.clone_from(project);
        }
        if let Some(dataset) = &cli.dataset {
            config.destination.dataset_id.clone_from(dataset);
        }
        if let Some(table) = &cli.table {
            config.destination.table_name.clone_from(table);
        }
        if let Some(location) = &cli.location {
            config.destination.location = Some(location.clone());
        }
        if let Some(credentials) = &cli.credentials {
            config.destination.credentials = Some(credentials.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Run the CLI command
    pub async fn run(&self, config: &PipelineConfig) -> Result<()> {
        match self.cli.command.clone().unwrap_or(Commands::Run) {
            Commands::Run => self.run_pipeline(config).await,
            Commands::Preview { limit } => self.preview(config, limit).await,
        }
    }

    /// Full fetch → transform → load
    async fn run_pipeline(&self, config: &PipelineConfig) -> Result<()> {
        let source = FeatureServiceSource::new(config.source.clone());
        let source_client = source.http_client()?;

        let auth = resolve_credentials(config.destination.credentials.as_deref())?;
        debug!("Using {} credentials", auth.kind());
        let warehouse_client = HttpClient::with_auth(HttpClientConfig::default(), auth)?;
        let warehouse = BigQueryClient::new(warehouse_client, &config.destination);

        let table = TableRef::from(&config.destination);
        let summary = pipeline::run(&source, &source_client, &warehouse, &table).await?;
        report(&summary);
        Ok(())
    }

    /// Fetch and transform, then print schema and sample rows
    async fn preview(&self, config: &PipelineConfig, limit: usize) -> Result<()> {
        let source = FeatureServiceSource::new(config.source.clone());
        let client = source.http_client()?;
        let prepared = pipeline::prepare(&source, &client).await?;

        let output = json!({
            "table": config.destination.table_id(),
            "features": prepared.feature_count,
            "schema": prepared.schema,
            "rows": batch_to_rows(&prepared.batch, limit)?,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

fn report(summary: &RunSummary) {
    match &summary.load {
        Some(load) => info!(
            "Appended {} rows to {} (job {})",
            summary.rows, summary.table, load.job_id
        ),
        None => info!("Nothing appended to {}", summary.table),
    }
}
