//! BigQuery REST client

use super::encode::{encode_parquet, ParquetWriterConfig};
use super::types::{DatasetRef, Ensured, Job, LoadOutcome, TableRef, TableSchema};
use super::Warehouse;
use crate::config::DestinationConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::JsonValue;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::Method;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const PARQUET_CONTENT_TYPE: &str = "application/octet-stream";

/// BigQuery warehouse over REST v2
#[derive(Debug)]
pub struct BigQueryClient {
    http: HttpClient,
    api_base: String,
    location: Option<String>,
    poll_interval: Duration,
    parquet: ParquetWriterConfig,
}

impl BigQueryClient {
    /// Create a client; `http` carries the authenticator
    pub fn new(http: HttpClient, config: &DestinationConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            location: config.location.clone(),
            poll_interval: config.poll_interval(),
            parquet: ParquetWriterConfig::new().with_row_group_size(config.row_group_size),
        }
    }

    fn project_url(&self, project_id: &str) -> String {
        format!("{}/bigquery/v2/projects/{project_id}", self.api_base)
    }

    fn datasets_url(&self, project_id: &str) -> String {
        format!("{}/datasets", self.project_url(project_id))
    }

    fn tables_url(&self, dataset: &DatasetRef) -> String {
        format!(
            "{}/{}/tables",
            self.datasets_url(&dataset.project_id),
            dataset.dataset_id
        )
    }

    fn upload_url(&self, project_id: &str) -> String {
        format!(
            "{}/upload/bigquery/v2/projects/{project_id}/jobs",
            self.api_base
        )
    }

    /// Look a resource up: `Ok(true)` if present, `Ok(false)` on 404
    async fn exists(&self, url: &str) -> Result<bool> {
        match self.http.get(url).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a resource; a 409 means someone else created it first
    async fn create(&self, url: &str, body: JsonValue) -> Result<Ensured> {
        match self.http.post_json::<JsonValue>(url, body).await {
            Ok(_) => Ok(Ensured::Created),
            Err(Error::HttpStatus { status: 409, .. }) => {
                debug!("Create at {} raced with another writer", url);
                Ok(Ensured::Existing)
            }
            Err(e) => Err(e),
        }
    }

    /// Open a resumable upload session for a load job
    async fn start_load(&self, table: &TableRef) -> Result<String> {
        let mut job_reference = json!({ "projectId": table.project_id });
        if let Some(location) = &self.location {
            job_reference["location"] = json!(location);
        }
        let job = json!({
            "jobReference": job_reference,
            "configuration": {
                "load": {
                    "destinationTable": table,
                    "sourceFormat": "PARQUET",
                    "writeDisposition": "WRITE_APPEND"
                }
            }
        });

        let request = RequestConfig::new()
            .query("uploadType", "resumable")
            .header("X-Upload-Content-Type", PARQUET_CONTENT_TYPE)
            .json(job);
        let response = self
            .http
            .request(Method::POST, &self.upload_url(&table.project_id), request)
            .await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
            .ok_or_else(|| Error::warehouse("Resumable upload response has no Location header"))
    }

    /// Poll a job until it is DONE
    async fn wait_for_job(&self, mut job: Job) -> Result<LoadOutcome> {
        let reference = job
            .job_reference
            .clone()
            .ok_or_else(|| Error::warehouse("Load job response has no jobReference"))?;
        let job_id = reference.job_id.clone();
        info!("Submitted load job {}", job_id);

        let job_url = format!("{}/jobs/{}", self.project_url(&reference.project_id), job_id);
        let mut request = RequestConfig::new();
        if let Some(location) = reference.location.as_ref().or(self.location.as_ref()) {
            request = request.query("location", location);
        }

        while !job.is_done() {
            let state = job.status.as_ref().map_or("UNKNOWN", |s| s.state.as_str());
            debug!("Load job {} is {}", job_id, state);
            tokio::time::sleep(self.poll_interval).await;
            job = self
                .http
                .get_json_with_config(&job_url, request.clone())
                .await?;
        }

        if let Some(error) = job.status.as_ref().and_then(|s| s.error_result.as_ref()) {
            return Err(Error::LoadJob {
                job_id,
                message: error.to_string(),
            });
        }

        let output_rows = job.output_rows();
        info!(
            "Load job {} completed ({} rows)",
            job_id,
            output_rows.map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );
        Ok(LoadOutcome {
            job_id,
            output_rows,
        })
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn ensure_dataset(&self, dataset: &DatasetRef) -> Result<Ensured> {
        let url = format!(
            "{}/{}",
            self.datasets_url(&dataset.project_id),
            dataset.dataset_id
        );
        if self.exists(&url).await? {
            info!("Dataset {} already exists", dataset);
            return Ok(Ensured::Existing);
        }

        let mut body = json!({ "datasetReference": dataset });
        if let Some(location) = &self.location {
            body["location"] = json!(location);
        }
        let ensured = self
            .create(&self.datasets_url(&dataset.project_id), body)
            .await?;
        if ensured.was_created() {
            info!("Created dataset {}", dataset);
        }
        Ok(ensured)
    }

    async fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<Ensured> {
        let dataset = table.dataset();
        let url = format!("{}/{}", self.tables_url(&dataset), table.table_id);
        if self.exists(&url).await? {
            info!("Table {} already exists", table);
            return Ok(Ensured::Existing);
        }

        let body = json!({
            "tableReference": table,
            "schema": schema,
        });
        let ensured = self.create(&self.tables_url(&dataset), body).await?;
        if ensured.was_created() {
            info!("Created table {} with {} columns", table, schema.len());
        }
        Ok(ensured)
    }

    async fn load(&self, table: &TableRef, batch: &RecordBatch) -> Result<LoadOutcome> {
        let data = encode_parquet(batch, &self.parquet)?;
        debug!(
            "Encoded {} rows as {} bytes of Parquet",
            batch.num_rows(),
            data.len()
        );

        let session_url = self.start_load(table).await?;
        let request = RequestConfig::new().bytes(data, PARQUET_CONTENT_TYPE);
        let job: Job = self
            .http
            .request_json(Method::PUT, &session_url, request)
            .await?;

        self.wait_for_job(job).await
    }
}
