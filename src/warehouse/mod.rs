//! Warehouse module
//!
//! Schema inference, idempotent dataset/table provisioning and bulk loads.
//!
//! # Overview
//!
//! - `infer_schema` / `conform_to_schema` - Arrow types → warehouse columns
//! - `Warehouse` - the destination seam used by the pipeline
//! - `BigQueryClient` - BigQuery REST v2 implementation
//! - `encode_parquet` - in-memory Parquet for load jobs

mod bigquery;
mod encode;
mod schema;
mod types;

pub use bigquery::BigQueryClient;
pub use encode::{encode_parquet, ParquetWriterConfig};
pub use schema::{conform_to_schema, infer_schema, warehouse_type};
pub use types::{
    DatasetRef, Ensured, ErrorProto, Job, JobReference, JobStatus, LoadOutcome, SchemaField,
    TableRef, TableSchema, WarehouseType,
};

use crate::error::Result;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;

/// A destination that can hold the loaded table
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Create the dataset unless it already exists
    async fn ensure_dataset(&self, dataset: &DatasetRef) -> Result<Ensured>;

    /// Create the table with `schema` unless it already exists
    async fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<Ensured>;

    /// Append `batch` to the table, returning once the load has finished
    async fn load(&self, table: &TableRef, batch: &RecordBatch) -> Result<LoadOutcome>;
}
