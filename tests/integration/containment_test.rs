//! End-to-end containment behavior.
//!
//! Drives the executor with mock clients and real connection failures.

use pretty_assertions::assert_eq;
use sqlrun::config::ExecutorOptions;
use sqlrun::db::{FailingDatabaseClient, MockDatabaseClient, Row, Value};
use sqlrun::error::ExecutorError;
use sqlrun::query::SqlExecutor;

fn options(query: &str) -> ExecutorOptions {
    ExecutorOptions::new(query, "sqlite::memory:")
}

#[tokio::test]
async fn test_round_trip_with_columns() {
    let client = MockDatabaseClient::with_rows(vec![Row::new().with("id", 1).with("name", "a")]);
    let outcome = SqlExecutor::new()
        .run_with_client(&client, &options("SELECT id, name FROM t"))
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&outcome.text).unwrap();
    assert_eq!(parsed, serde_json::json!([{"id": 1, "name": "a"}]));
}

#[tokio::test]
async fn test_without_columns_no_column_name_in_output() {
    let client = MockDatabaseClient::with_rows(vec![
        Row::new().with("secret_column", "v1").with("other_col", 2),
        Row::new().with("secret_column", Value::Null).with("other_col", 3),
    ]);
    let outcome = SqlExecutor::new()
        .run_with_client(&client, &options("SELECT * FROM t").include_columns(false))
        .await
        .unwrap();

    assert!(!outcome.text.contains("secret_column"));
    assert!(!outcome.text.contains("other_col"));
    let parsed: serde_json::Value = serde_json::from_str(&outcome.text).unwrap();
    assert_eq!(parsed, serde_json::json!([["v1", 2], [null, 3]]));
}

#[tokio::test]
async fn test_failure_without_passthrough_propagates() {
    let client = FailingDatabaseClient::with_message("syntax error");
    let err = SqlExecutor::new()
        .run_with_client(&client, &options("SELECT *").add_error(true))
        .await
        .unwrap_err();

    assert_eq!(err, ExecutorError::query("syntax error"));
}

#[tokio::test]
async fn test_passthrough_returns_query_text() {
    let query = "SELEC nonsense FROM\n  nowhere;";
    let client = FailingDatabaseClient::with_message("syntax error");
    let outcome = SqlExecutor::new()
        .run_with_client(&client, &options(query).passthrough(true))
        .await
        .unwrap();

    assert_eq!(outcome.text, query);
    assert_eq!(outcome.status, "syntax error");
}

#[tokio::test]
async fn test_passthrough_with_add_error() {
    let client = FailingDatabaseClient::with_message("syntax error");
    let outcome = SqlExecutor::new()
        .run_with_client(
            &client,
            &options("SELECT *").passthrough(true).add_error(true),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.text,
        "syntax error\n\nError: Query(\"syntax error\")\n\nQuery: SELECT *"
    );
}

#[tokio::test]
async fn test_connection_failure_always_raises() {
    for (passthrough, add_error) in [(false, false), (true, false), (false, true), (true, true)] {
        let opts = ExecutorOptions::new("SELECT 1", "definitely not a uri")
            .passthrough(passthrough)
            .add_error(add_error);

        let err = SqlExecutor::new().run(&opts).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Connection(_)));
        assert!(err
            .to_string()
            .starts_with("An error occurred while connecting to the database"));
    }
}
