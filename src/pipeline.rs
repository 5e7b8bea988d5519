//! Fetch → transform → load orchestration
//!
//! One run is a straight line: fetch every feature, build the typed table,
//! infer its schema, make sure the dataset and table exist, then append the
//! rows with a load job. The first error stops the run.

use crate::error::Result;
use crate::http::HttpClient;
use crate::source::FeatureServiceSource;
use crate::transform::build_table;
use crate::warehouse::{
    conform_to_schema, infer_schema, Ensured, LoadOutcome, TableRef, TableSchema, Warehouse,
};
use arrow::record_batch::RecordBatch;
use std::time::Instant;
use tracing::{info, warn};

/// The typed table ready to load
#[derive(Debug, Clone)]
pub struct PreparedTable {
    /// Number of features fetched
    pub feature_count: usize,
    /// Transformed rows
    pub batch: RecordBatch,
    /// Warehouse schema inferred from `batch`
    pub schema: TableSchema,
}

/// What a run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub table: TableRef,
    /// Features fetched from the source
    pub features: usize,
    pub rows: usize,
    pub columns: usize,
    pub dataset_status: Ensured,
    pub table_status: Ensured,
    /// `None` when there was nothing to load
    pub load: Option<LoadOutcome>,
    pub duration_ms: u64,
}

/// Fetch and transform, without touching the warehouse
pub async fn prepare(source: &FeatureServiceSource, client: &HttpClient) -> Result<PreparedTable> {
    let features = source.fetch_records(client).await?;
    let batch = build_table(&features)?;
    let schema = infer_schema(&batch);
    info!(
        "Transformed {} features into {} rows x {} columns",
        features.len(),
        batch.num_rows(),
        batch.num_columns()
    );

    Ok(PreparedTable {
        feature_count: features.len(),
        batch,
        schema,
    })
}

/// Run the whole pipeline into `table`
pub async fn run(
    source: &FeatureServiceSource,
    client: &HttpClient,
    warehouse: &dyn Warehouse,
    table: &TableRef,
) -> Result<RunSummary> {
    let start = Instant::now();

    let prepared = prepare(source, client).await?;

    let dataset_status = warehouse.ensure_dataset(&table.dataset()).await?;
    let table_status = warehouse.ensure_table(table, &prepared.schema).await?;

    let rows = prepared.batch.num_rows();
    let load = if rows == 0 {
        warn!("No features fetched; skipping load into {}", table);
        None
    } else {
        let batch = conform_to_schema(&prepared.batch, &prepared.schema)?;
        Some(warehouse.load(table, &batch).await?)
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    info!("Run into {} finished in {} ms", table, duration_ms);

    Ok(RunSummary {
        table: table.clone(),
        features: prepared.feature_count,
        rows,
        columns: prepared.batch.num_columns(),
        dataset_status,
        table_status,
        load,
        duration_ms,
    })
}
