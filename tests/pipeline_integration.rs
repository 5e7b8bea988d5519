//! End-to-end pipeline tests against mock services

use arrow::array::{Array, Int64Array};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use schools_etl::config::{DestinationConfig, SourceConfig};
use schools_etl::http::HttpClient;
use schools_etl::source::FeatureServiceSource;
use schools_etl::warehouse::{
    BigQueryClient, DatasetRef, Ensured, LoadOutcome, TableRef, TableSchema, Warehouse,
    WarehouseType,
};
use schools_etl::{pipeline, Error, Result};
use serde_json::{json, Value};
use std::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY_PATH: &str = "/arcgis/rest/services/School_Characteristics_Current/FeatureServer/3/query";

/// Warehouse that records every call
#[derive(Default)]
struct RecordingWarehouse {
    calls: Mutex<Vec<String>>,
    loaded: Mutex<Option<RecordBatch>>,
    schema: Mutex<Option<TableSchema>>,
}

impl RecordingWarehouse {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn ensure_dataset(&self, dataset: &DatasetRef) -> Result<Ensured> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("ensure_dataset {dataset}"));
        Ok(Ensured::Created)
    }

    async fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<Ensured> {
        self.calls.lock().unwrap().push(format!("ensure_table {table}"));
        *self.schema.lock().unwrap() = Some(schema.clone());
        Ok(Ensured::Created)
    }

    async fn load(&self, table: &TableRef, batch: &RecordBatch) -> Result<LoadOutcome> {
        self.calls.lock().unwrap().push(format!("load {table}"));
        *self.loaded.lock().unwrap() = Some(batch.clone());
        Ok(LoadOutcome {
            job_id: "job_1".to_string(),
            output_rows: Some(batch.num_rows() as u64),
        })
    }
}

fn school(id: i64, overrides: Value) -> Value {
    let mut properties = json!({
        "NCESSCH": "000000000000",
        "SURVYEAR": "2022-2023",
        "STABR": "AL",
        "LEA_NAME": "Albertville City",
        "SCH_NAME": "Albertville Middle School",
        "LSTREET1": "600 E Alabama Ave",
        "LCITY": "Albertville",
        "VIRTUAL": "Not Virtual",
        "SCHOOL_LEVEL": "Middle",
        "TOTAL": 1,
        "AM": 1,
        "AS_": 1,
        "BL": 1,
        "HP": 1,
        "HI": 1,
        "TR": 1,
        "WH": 1
    });
    if let (Some(base), Some(overrides)) = (properties.as_object_mut(), overrides.as_object()) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    json!({
        "type": "Feature",
        "id": id,
        "geometry": {"type": "Point", "coordinates": [-86.2, 34.3]},
        "properties": properties
    })
}

async fn feature_service(features: Vec<Value>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": features
        })))
        .mount(&server)
        .await;
    server
}

fn source_for(server: &MockServer) -> FeatureServiceSource {
    FeatureServiceSource::new(SourceConfig {
        url: format!("{}{QUERY_PATH}", server.uri()),
        ..SourceConfig::default()
    })
}

fn int_values(batch: &RecordBatch, name: &str) -> Vec<i64> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .values()
        .to_vec()
}

fn field_type(schema: &TableSchema, name: &str) -> WarehouseType {
    schema
        .fields
        .iter()
        .find(|field| field.name == name)
        .unwrap()
        .field_type
}

#[tokio::test]
async fn test_two_schools_end_to_end() {
    let server = feature_service(vec![
        school(1, json!({"NCESSCH": "123", "TOTAL": "45.0", "AM": null})),
        school(2, json!({"NCESSCH": "456", "TOTAL": null, "AM": "3"})),
    ])
    .await;

    let warehouse = RecordingWarehouse::default();
    let table = TableRef::new("proj", "schools", "data");
    let client = HttpClient::new().unwrap();

    let summary = pipeline::run(&source_for(&server), &client, &warehouse, &table)
        .await
        .unwrap();

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.features, 2);
    assert_eq!(summary.columns, 17);
    assert_eq!(summary.load.unwrap().job_id, "job_1");
    assert_eq!(
        warehouse.calls(),
        vec![
            "ensure_dataset proj.schools",
            "ensure_table proj.schools.data",
            "load proj.schools.data",
        ]
    );

    let batch = warehouse.loaded.lock().unwrap().clone().unwrap();
    assert_eq!(int_values(&batch, "school_id"), vec![123, 456]);
    assert_eq!(int_values(&batch, "total_students_all_grades"), vec![45, 0]);
    assert_eq!(int_values(&batch, "ai_an_total"), vec![0, 3]);

    let schema = warehouse.schema.lock().unwrap().clone().unwrap();
    assert_eq!(schema.len(), 17);
    assert_eq!(field_type(&schema, "school_id"), WarehouseType::Integer);
    assert_eq!(field_type(&schema, "school_name"), WarehouseType::String);
}

#[tokio::test]
async fn test_fetch_failure_never_reaches_warehouse() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let warehouse = RecordingWarehouse::default();
    let table = TableRef::new("proj", "schools", "data");
    let client = HttpClient::new().unwrap();

    let err = pipeline::run(&source_for(&server), &client, &warehouse, &table)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 502, .. }));
    assert!(warehouse.calls().is_empty());
}

#[tokio::test]
async fn test_missing_field_never_reaches_warehouse() {
    let mut broken = school(2, json!({}));
    if let Some(properties) = broken["properties"].as_object_mut() {
        properties.remove("SCHOOL_LEVEL");
    }
    let server = feature_service(vec![school(1, json!({})), broken]).await;

    let warehouse = RecordingWarehouse::default();
    let table = TableRef::new("proj", "schools", "data");
    let client = HttpClient::new().unwrap();

    let err = pipeline::run(&source_for(&server), &client, &warehouse, &table)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingField { record: 1, ref field } if field == "SCHOOL_LEVEL"));
    assert!(warehouse.calls().is_empty());
}

#[tokio::test]
async fn test_empty_fetch_skips_load() {
    let server = feature_service(vec![]).await;

    let warehouse = RecordingWarehouse::default();
    let table = TableRef::new("proj", "schools", "data");
    let client = HttpClient::new().unwrap();

    let summary = pipeline::run(&source_for(&server), &client, &warehouse, &table)
        .await
        .unwrap();

    assert_eq!(summary.rows, 0);
    assert!(summary.load.is_none());
    assert_eq!(
        warehouse.calls(),
        vec!["ensure_dataset proj.schools", "ensure_table proj.schools.data"]
    );
}

#[tokio::test]
async fn test_run_against_bigquery_api() {
    let source_server = feature_service(vec![
        school(1, json!({"NCESSCH": "123"})),
        school(2, json!({"NCESSCH": "456"})),
    ])
    .await;

    let bigquery = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bigquery/v2/projects/proj/datasets/schools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&bigquery)
        .await;
    Mock::given(method("GET"))
        .and(path("/bigquery/v2/projects/proj/datasets/schools/tables/data"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&bigquery)
        .await;
    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/datasets/schools/tables"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&bigquery)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload/bigquery/v2/projects/proj/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Location", format!("{}/upload/session/1", bigquery.uri()).as_str()),
        )
        .expect(1)
        .mount(&bigquery)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/session/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobReference": {"projectId": "proj", "jobId": "job_9"},
            "status": {"state": "DONE"},
            "statistics": {"load": {"outputRows": "2"}}
        })))
        .expect(1)
        .mount(&bigquery)
        .await;

    let destination = DestinationConfig {
        project_id: "proj".to_string(),
        dataset_id: "schools".to_string(),
        table_name: "data".to_string(),
        api_base: bigquery.uri(),
        poll_interval_ms: 1,
        ..DestinationConfig::default()
    };
    let warehouse = BigQueryClient::new(HttpClient::new().unwrap(), &destination);
    let table = TableRef::from(&destination);
    let client = HttpClient::new().unwrap();

    let summary = pipeline::run(&source_for(&source_server), &client, &warehouse, &table)
        .await
        .unwrap();

    assert_eq!(summary.dataset_status, Ensured::Existing);
    assert_eq!(summary.table_status, Ensured::Created);
    assert_eq!(
        summary.load,
        Some(LoadOutcome {
            job_id: "job_9".to_string(),
            output_rows: Some(2),
        })
    );
}
