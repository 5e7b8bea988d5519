//! Pipeline configuration
//!
//! Every field defaults to the constants the pipeline was built around, so an
//! empty config file (or no file at all) targets the public NCES layer and the
//! `schools_information` dataset.

use crate::error::{Error, Result};
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// School_Characteristics_Current layer 3 query endpoint
pub const DEFAULT_SOURCE_URL: &str = "https://services1.arcgis.com/Ua5sjt3LWTPigjyD/arcgis/rest/services/School_Characteristics_Current/FeatureServer/3/query";

/// Default BigQuery project
pub const DEFAULT_PROJECT_ID: &str = "voltaic-charter-394503";

/// Default BigQuery dataset
pub const DEFAULT_DATASET_ID: &str = "schools_information";

/// Default BigQuery table
pub const DEFAULT_TABLE_NAME: &str = "schools_information_data";

/// BigQuery REST API root
pub const DEFAULT_API_BASE: &str = "https://bigquery.googleapis.com";

/// Rows per Parquet row group in load uploads
pub const DEFAULT_ROW_GROUP_SIZE: usize = 1024 * 1024;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Feature service settings
    #[serde(default)]
    pub source: SourceConfig,

    /// BigQuery destination settings
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Default log level when RUST_LOG is unset
    #[serde(default)]
    pub log_level: LogLevel,
}

impl PipelineConfig {
    /// Load configuration from a YAML (or JSON) file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a YAML (or JSON) string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.destination.validate()
    }
}

// ============================================================================
// Source Config
// ============================================================================

/// Feature service query settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Query endpoint URL
    #[serde(default = "default_source_url")]
    pub url: String,

    /// Query parameters sent with every request
    #[serde(default = "default_source_params")]
    pub params: BTreeMap<String, String>,

    /// Records per page; `None` issues a single request
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Request timeout in seconds; `None` keeps the client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_source_params() -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("outFields".to_string(), "*".to_string());
    params.insert("where".to_string(), "1=1".to_string());
    params.insert("f".to_string(), "geojson".to_string());
    params
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            params: default_source_params(),
            page_size: None,
            timeout_secs: None,
        }
    }
}

impl SourceConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.url)?;
        if self.page_size == Some(0) {
            return Err(Error::invalid_value(
                "source.page_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Destination Config
// ============================================================================

/// BigQuery destination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// GCP project that owns the dataset
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Dataset id
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,

    /// Table name inside the dataset
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Dataset location (e.g. "US"); `None` lets BigQuery pick
    #[serde(default)]
    pub location: Option<String>,

    /// REST API root
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Delay between load-job status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum rows per Parquet row group in load uploads
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    /// Credentials file; `None` uses application-default credentials
    #[serde(default)]
    pub credentials: Option<PathBuf>,
}

fn default_project_id() -> String {
    DEFAULT_PROJECT_ID.to_string()
}

fn default_dataset_id() -> String {
    DEFAULT_DATASET_ID.to_string()
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_row_group_size() -> usize {
    DEFAULT_ROW_GROUP_SIZE
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            dataset_id: default_dataset_id(),
            table_name: default_table_name(),
            location: None,
            api_base: default_api_base(),
            poll_interval_ms: default_poll_interval_ms(),
            row_group_size: default_row_group_size(),
            credentials: None,
        }
    }
}

impl DestinationConfig {
    /// Fully-qualified table id: `project.dataset.table`
    pub fn table_id(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_name)
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(Error::invalid_value(
                "destination.project_id",
                "must not be empty",
            ));
        }
        validate_identifier("destination.dataset_id", &self.dataset_id)?;
        validate_identifier("destination.table_name", &self.table_name)?;
        url::Url::parse(&self.api_base)?;
        if self.row_group_size == 0 {
            return Err(Error::invalid_value(
                "destination.row_group_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Dataset and table ids: letters, digits and underscores, at most 1024 chars
fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_value(field, "must not be empty"));
    }
    if value.len() > 1024 {
        return Err(Error::invalid_value(field, "must be at most 1024 characters"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(Error::invalid_value(
            field,
            format!("invalid character '{c}' in '{value}'"),
        ));
    }
    Ok(())
}
