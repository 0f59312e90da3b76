//! Per-view query and union tests.
//!
//! Covers view tagging, row ordering, dialect-dependent date rendering, and
//! failure propagation through `ViewLoader::read_views`.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use viewmerge::engine::MockQueryEngine;
use viewmerge::{ColumnInfo, Dialect, ResultTable, Value, View, ViewLoader, ViewmergeError, WarehouseConfig};

fn table(columns: &[(&str, &str)], rows: Vec<Vec<Value>>) -> ResultTable {
    ResultTable::with_data(
        columns
            .iter()
            .map(|(name, data_type)| ColumnInfo::new(*name, *data_type))
            .collect(),
        rows,
    )
}

fn loader(engine: &Arc<MockQueryEngine>) -> ViewLoader {
    ViewLoader::new(
        engine.clone(),
        WarehouseConfig::new("test-project", "test-key"),
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_rows_tagged_with_view_label_in_view_order() {
    let engine = Arc::new(MockQueryEngine::new());
    engine.push_table(table(
        &[("sessions", "INTEGER")],
        vec![vec![Value::Int(10)], vec![Value::Int(20)]],
    ));
    engine.push_table(table(&[("sessions", "INTEGER")], vec![vec![Value::Int(30)]]));

    let result = loader(&engine)
        .read_views(
            "SELECT sessions FROM [{}.ga] WHERE date >= '{}' AND date <= '{}'",
            &[View::new("android", "111"), View::new("ios", "222")],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::Legacy,
        )
        .await
        .unwrap()
        .expect("non-empty views must yield a table");

    assert_eq!(result.column_names(), vec!["sessions", "device_type"]);
    assert_eq!(result.row_count(), 3);
    // Per-view row order and inter-view order are both preserved.
    assert_eq!(result.rows[0], vec![Value::Int(10), Value::from("android")]);
    assert_eq!(result.rows[1], vec![Value::Int(20), Value::from("android")]);
    assert_eq!(result.rows[2], vec![Value::Int(30), Value::from("ios")]);
}

#[tokio::test]
async fn test_view_id_substituted_per_view() {
    let engine = Arc::new(MockQueryEngine::with_tables(vec![
        table(&[("n", "INTEGER")], vec![]),
        table(&[("n", "INTEGER")], vec![]),
    ]));

    loader(&engine)
        .read_views(
            "SELECT n FROM [{}.ga]",
            &[View::new("android", "111"), View::new("ios", "222")],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::Legacy,
        )
        .await
        .unwrap();

    let dispatched = engine.dispatched();
    assert_eq!(dispatched.len(), 2);
    assert_eq!(dispatched[0].sql, "SELECT n FROM [111.ga]");
    assert_eq!(dispatched[1].sql, "SELECT n FROM [222.ga]");
    assert_eq!(dispatched[0].project_id, "test-project");
}

#[tokio::test]
async fn test_standard_dialect_renders_compact_dates() {
    let engine = Arc::new(MockQueryEngine::with_tables(vec![table(
        &[("n", "INTEGER")],
        vec![],
    )]));

    loader(&engine)
        .read_views(
            "SELECT n FROM [{}.ga] WHERE date BETWEEN '{}' AND '{}'",
            &[View::new("android", "111")],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::Standard,
        )
        .await
        .unwrap();

    let dispatched = engine.dispatched();
    assert_eq!(
        dispatched[0].sql,
        "SELECT n FROM [111.ga] WHERE date BETWEEN '20210305' AND '20210312'"
    );
    assert_eq!(dispatched[0].dialect, "standard");
}

#[tokio::test]
async fn test_legacy_dialect_passes_iso_dates_through() {
    let engine = Arc::new(MockQueryEngine::with_tables(vec![table(
        &[("n", "INTEGER")],
        vec![],
    )]));

    loader(&engine)
        .read_views(
            "{1}..{2}",
            &[View::new("android", "111")],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::Legacy,
        )
        .await
        .unwrap();

    assert_eq!(engine.dispatched()[0].sql, "2021-03-05..2021-03-12");
    assert_eq!(engine.dispatched()[0].dialect, "legacy");
}

#[tokio::test]
async fn test_unknown_dialect_reaches_engine_verbatim() {
    let engine = Arc::new(MockQueryEngine::with_tables(vec![table(
        &[("n", "INTEGER")],
        vec![],
    )]));

    loader(&engine)
        .read_views(
            "SELECT n",
            &[View::new("android", "111")],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::parse("bigquery-next"),
        )
        .await
        .unwrap();

    assert_eq!(engine.dispatched()[0].dialect, "bigquery-next");
}

#[tokio::test]
async fn test_empty_views_is_no_data() {
    let engine = Arc::new(MockQueryEngine::new());

    let result = loader(&engine)
        .read_views(
            "SELECT n",
            &[],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::Legacy,
        )
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(engine.dispatched().is_empty());
}

#[tokio::test]
async fn test_failure_aborts_remaining_views() {
    let engine = Arc::new(MockQueryEngine::new());
    engine.push_table(table(&[("n", "INTEGER")], vec![vec![Value::Int(1)]]));
    engine.push_error(ViewmergeError::engine("quota exceeded"));
    engine.push_table(table(&[("n", "INTEGER")], vec![vec![Value::Int(3)]]));

    let err = loader(&engine)
        .read_views(
            "SELECT n FROM [{}.ga]",
            &[
                View::new("android", "111"),
                View::new("ios", "222"),
                View::new("tablet", "333"),
            ],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::Legacy,
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Engine error: quota exceeded");
    // The third view is never queried.
    assert_eq!(engine.dispatched().len(), 2);
}

#[tokio::test]
async fn test_mismatched_view_schemas_fail() {
    let engine = Arc::new(MockQueryEngine::new());
    engine.push_table(table(&[("sessions", "INTEGER")], vec![vec![Value::Int(1)]]));
    engine.push_table(table(&[("pageviews", "INTEGER")], vec![vec![Value::Int(2)]]));

    let err = loader(&engine)
        .read_views(
            "SELECT * FROM [{}.ga]",
            &[View::new("android", "111"), View::new("ios", "222")],
            date(2021, 3, 5),
            date(2021, 3, 12),
            "device_type",
            &Dialect::Legacy,
        )
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Schema Error");
}
