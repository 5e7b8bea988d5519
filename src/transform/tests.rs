//! Transformation tests

use super::*;
use crate::error::Error;
use crate::source::Feature;
use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn school(id: i64, properties: Value) -> Feature {
    let mut base = json!({
        "NCESSCH": "010000500870",
        "SURVYEAR": "2022-2023",
        "STABR": "AL",
        "LEA_NAME": "Albertville City",
        "SCH_NAME": "Albertville Middle School",
        "LSTREET1": "600 E Alabama Ave",
        "LCITY": "Albertville",
        "VIRTUAL": "Not Virtual",
        "SCHOOL_LEVEL": "Middle",
        "TOTAL": 920,
        "AM": 2,
        "AS_": 5,
        "BL": 33,
        "HP": 1,
        "HI": 410,
        "TR": 12,
        "WH": 457
    });
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), properties.as_object()) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(json!({"type": "Feature", "id": id, "properties": base})).unwrap()
}

fn int_column(batch: &arrow::record_batch::RecordBatch, name: &str) -> Vec<i64> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .values()
        .to_vec()
}

// ============================================================================
// Field contract
// ============================================================================

#[test]
fn test_field_mapping_is_bijective() {
    let sources = source_fields();
    let destinations = destination_columns();
    assert_eq!(sources.len(), 17);
    assert_eq!(destinations.len(), 17);

    let mut unique_sources = sources.clone();
    unique_sources.sort_unstable();
    unique_sources.dedup();
    assert_eq!(unique_sources.len(), 17);

    let mut unique_destinations = destinations.clone();
    unique_destinations.sort_unstable();
    unique_destinations.dedup();
    assert_eq!(unique_destinations.len(), 17);
}

#[test]
fn test_numeric_columns_are_destinations() {
    let destinations = destination_columns();
    for name in NUMERIC_COLUMNS {
        assert!(destinations.contains(&name), "{name} is not a destination column");
    }
}

// ============================================================================
// Flatten
// ============================================================================

#[test]
fn test_flatten_shape() {
    let features = vec![school(1, json!({})), school(2, json!({})), school(3, json!({}))];
    let table = flatten(&features, &source_fields()).unwrap();

    assert_eq!(table.num_columns(), 17);
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.names(), source_fields());
}

#[test]
fn test_flatten_keeps_raw_values() {
    let features = vec![school(1, json!({"TOTAL": "45.0", "AM": null}))];
    let table = flatten(&features, &["TOTAL", "AM", "SCH_NAME"]).unwrap();

    assert_eq!(table.column("TOTAL").unwrap().values, vec![json!("45.0")]);
    assert_eq!(table.column("AM").unwrap().values, vec![Value::Null]);
    assert_eq!(
        table.column("SCH_NAME").unwrap().values,
        vec![json!("Albertville Middle School")]
    );
}

#[test]
fn test_flatten_reads_identifier_from_top_level() {
    let features = vec![school(41, json!({})), school(42, json!({}))];
    let table = flatten(&features, &["id", "STABR"]).unwrap();

    assert_eq!(table.column("id").unwrap().values, vec![json!(41), json!(42)]);
}

#[test]
fn test_flatten_missing_field() {
    let mut incomplete = school(2, json!({}));
    if let Some(properties) = incomplete.properties.as_mut() {
        properties.remove("LCITY");
    }
    let features = vec![school(1, json!({})), incomplete];

    let err = flatten(&features, &source_fields()).unwrap_err();
    match err {
        Error::MissingField { record, field } => {
            assert_eq!(record, 1);
            assert_eq!(field, "LCITY");
        }
        other => panic!("Expected MissingField, got {other:?}"),
    }
}

#[test]
fn test_flatten_no_records() {
    let table = flatten(&[], &source_fields()).unwrap();
    assert_eq!(table.num_columns(), 17);
    assert_eq!(table.num_rows(), 0);
}

// ============================================================================
// Rename
// ============================================================================

#[test]
fn test_rename_full_mapping() {
    let features = vec![school(1, json!({}))];
    let table = flatten(&features, &source_fields()).unwrap();
    let renamed = rename(table, FIELD_MAPPING).unwrap();

    assert_eq!(renamed.names(), destination_columns());
    assert_eq!(
        renamed.column("state_code").unwrap().values,
        vec![json!("AL")]
    );
}

#[test]
fn test_rename_leaves_unmapped_columns() {
    let table = ColumnTable::from_columns(vec![
        Column::new("NCESSCH", vec![json!("1")]),
        Column::new("extra", vec![json!(true)]),
    ])
    .unwrap();

    let renamed = rename(table, &[("NCESSCH", "school_id")]).unwrap();
    assert_eq!(renamed.names(), vec!["school_id", "extra"]);
}

#[test]
fn test_rename_collision_is_error() {
    let table = ColumnTable::from_columns(vec![
        Column::new("a", vec![json!(1)]),
        Column::new("b", vec![json!(2)]),
    ])
    .unwrap();

    let err = rename(table, &[("a", "b")]).unwrap_err();
    assert!(matches!(err, Error::DuplicateColumn { column } if column == "b"));
}

#[test]
fn test_column_table_rejects_ragged_columns() {
    let err = ColumnTable::from_columns(vec![
        Column::new("a", vec![json!(1), json!(2)]),
        Column::new("b", vec![json!(1)]),
    ])
    .unwrap_err();

    assert!(matches!(
        err,
        Error::ColumnLength { expected: 2, actual: 1, .. }
    ));
}

// ============================================================================
// Coercion
// ============================================================================

#[test_case(json!("45.0"), 45 ; "numeric text")]
#[test_case(json!(" 12 "), 12 ; "padded text")]
#[test_case(json!(7.9), 7 ; "float truncates")]
#[test_case(json!(-2.5), -2 ; "negative truncates toward zero")]
#[test_case(json!(920), 920 ; "integer")]
#[test_case(json!("010000500870"), 10_000_500_870 ; "leading zeros")]
#[test_case(Value::Null, 0 ; "null")]
#[test_case(json!(""), 0 ; "blank text")]
#[test_case(json!("NaN"), 0 ; "nan text")]
#[test_case(json!(true), 1 ; "boolean")]
#[test_case(json!(9_007_199_254_740_993_i64), 9_007_199_254_740_993 ; "integer beyond f64 precision")]
#[test_case(json!("9007199254740993"), 9_007_199_254_740_993 ; "integer text beyond f64 precision")]
#[test_case(json!(i64::MAX), i64::MAX ; "largest integer")]
#[test_case(json!(i64::MIN.to_string()), i64::MIN ; "smallest integer text")]
fn test_coerce_value(value: Value, expected: i64) {
    let column = Column::new("ai_an_total", vec![value]);
    assert_eq!(coerce_integer_column(&column).unwrap(), vec![expected]);
}

#[test_case(json!("abc") ; "text")]
#[test_case(json!("inf") ; "infinity")]
#[test_case(json!("1e30") ; "out of range")]
#[test_case(json!("9223372036854775808") ; "integer text past i64")]
#[test_case(json!(u64::MAX) ; "integer past i64")]
#[test_case(json!([1]) ; "array")]
#[test_case(json!({"n": 1}) ; "object")]
fn test_coerce_rejects(value: Value) {
    let column = Column::new("ai_an_total", vec![json!(1), value]);
    let err = coerce_integer_column(&column).unwrap_err();

    match err {
        Error::Conversion { column, row, .. } => {
            assert_eq!(column, "ai_an_total");
            assert_eq!(row, 1);
        }
        other => panic!("Expected Conversion, got {other:?}"),
    }
}

// ============================================================================
// Column typing
// ============================================================================

#[test_case(vec![json!(1), json!(2)], DataType::Int64 ; "integers")]
#[test_case(vec![json!(1), Value::Null], DataType::Float64 ; "integers with nulls")]
#[test_case(vec![json!(1), json!(2.5)], DataType::Float64 ; "mixed numbers")]
#[test_case(vec![json!(true), json!(false)], DataType::Boolean ; "booleans")]
#[test_case(vec![json!(true), Value::Null], DataType::Utf8 ; "booleans with nulls")]
#[test_case(vec![json!("a"), json!(1)], DataType::Utf8 ; "mixed text")]
#[test_case(vec![Value::Null, Value::Null], DataType::Utf8 ; "all null")]
#[test_case(vec![], DataType::Utf8 ; "empty")]
fn test_infer_column_type(values: Vec<Value>, expected: DataType) {
    assert_eq!(infer_column_type(&values), expected);
}

#[test]
fn test_to_record_batch_types() {
    let table = ColumnTable::from_columns(vec![
        Column::new("count", vec![json!("3"), Value::Null]),
        Column::new("name", vec![json!("a"), Value::Null]),
        Column::new("ratio", vec![json!(1), json!(0.5)]),
        Column::new("flag", vec![json!(true), json!(false)]),
    ])
    .unwrap();

    let batch = to_record_batch(&table, &["count"]).unwrap();
    let schema = batch.schema();

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert!(!schema.field(0).is_nullable());
    assert_eq!(int_column(&batch, "count"), vec![3, 0]);

    let names = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(names.value(0), "a");
    assert!(names.is_null(1));

    let ratios = batch
        .column(2)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(ratios.value(0), 1.0);
    assert_eq!(ratios.value(1), 0.5);

    let flags = batch
        .column(3)
        .as_any()
        .downcast_ref::<BooleanArray>()
        .unwrap();
    assert!(flags.value(0));
    assert!(!flags.value(1));
}

#[test]
fn test_to_record_batch_missing_numeric_column() {
    let table = ColumnTable::from_columns(vec![Column::new("name", vec![json!("a")])]).unwrap();

    let err = to_record_batch(&table, &["count"]).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { column } if column == "count"));
}

// ============================================================================
// Whole chain
// ============================================================================

#[test]
fn test_build_table_coerces_counts() {
    let features = vec![
        school(1, json!({"NCESSCH": "123", "TOTAL": "45.0", "AM": null})),
        school(2, json!({"NCESSCH": "456", "TOTAL": null, "AM": "3"})),
    ];

    let batch = build_table(&features).unwrap();

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 17);
    assert_eq!(int_column(&batch, "school_id"), vec![123, 456]);
    assert_eq!(int_column(&batch, "total_students_all_grades"), vec![45, 0]);
    assert_eq!(int_column(&batch, "ai_an_total"), vec![0, 3]);

    for name in NUMERIC_COLUMNS {
        assert_eq!(
            batch.schema().field_with_name(name).unwrap().data_type(),
            &DataType::Int64
        );
    }
    assert_eq!(
        batch
            .schema()
            .field_with_name("school_name")
            .unwrap()
            .data_type(),
        &DataType::Utf8
    );
}

#[test]
fn test_build_table_conversion_error() {
    let features = vec![school(1, json!({"WH": "many"}))];

    let err = build_table(&features).unwrap_err();
    assert!(matches!(err, Error::Conversion { column, .. } if column == "white_total"));
}

#[test]
fn test_build_table_empty() {
    let batch = build_table(&[]).unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert_eq!(batch.num_columns(), 17);
}

// ============================================================================
// Preview rows
// ============================================================================

#[test]
fn test_batch_to_rows_limit() {
    let features = vec![
        school(1, json!({"NCESSCH": "123", "SCH_NAME": "Alpha"})),
        school(2, json!({"NCESSCH": "456", "SCH_NAME": "Beta"})),
        school(3, json!({"NCESSCH": "789", "SCH_NAME": "Gamma"})),
    ];
    let batch = build_table(&features).unwrap();

    let rows = batch_to_rows(&batch, 2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["school_id"], json!(123));
    assert_eq!(rows[1]["school_name"], json!("Beta"));
    assert_eq!(rows[1]["white_total"], json!(457));
}

#[test]
fn test_batch_to_rows_nulls() {
    let table = ColumnTable::from_columns(vec![Column::new(
        "ratio",
        vec![json!(0.5), Value::Null],
    )])
    .unwrap();
    let batch = to_record_batch(&table, &[]).unwrap();

    let rows = batch_to_rows(&batch, 10).unwrap();
    assert_eq!(rows, vec![json!({"ratio": 0.5}), json!({"ratio": null})]);
}
