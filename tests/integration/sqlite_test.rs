//! SQLite execution integration tests.
//!
//! Runs the full pipeline against temporary SQLite databases.

use pretty_assertions::assert_eq;
use sqlrun::config::ExecutorOptions;
use sqlrun::db::{self, DatabaseBackend, DatabaseClient, SqliteClient};
use sqlrun::error::ExecutorError;
use sqlrun::query::SqlExecutor;
use tempfile::TempDir;

/// Creates a file-backed database seeded with a small `users` table.
async fn seeded_database() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("app.db").display());

    let client = SqliteClient::connect(&url).await.unwrap();
    for statement in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, bio TEXT, created_at DATETIME)",
        "INSERT INTO users VALUES (1, 'alice@example.com', 'short bio', '2024-01-01 00:00:00')",
        "INSERT INTO users VALUES (2, 'bob@example.com', NULL, '2024-01-01 00:00:01')",
    ] {
        client.fetch_rows(statement).await.unwrap();
    }
    client.close().await.unwrap();

    (dir, url)
}

#[tokio::test]
async fn test_connect_factory_picks_sqlite() {
    let client = db::connect("sqlite::memory:").await.unwrap();
    assert_eq!(client.backend(), DatabaseBackend::Sqlite);
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_select_with_columns() {
    let (_dir, url) = seeded_database().await;
    let options = ExecutorOptions::new("SELECT id, email, bio, created_at FROM users ORDER BY id", url);

    let outcome = SqlExecutor::new().run(&options).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&outcome.text).unwrap();

    assert_eq!(
        parsed,
        serde_json::json!([
            {"id": 1, "email": "alice@example.com", "bio": "short bio", "created_at": 1704067200.0},
            {"id": 2, "email": "bob@example.com", "bio": null, "created_at": 1704067201.0},
        ])
    );
}

#[tokio::test]
async fn test_select_without_columns() {
    let (_dir, url) = seeded_database().await;
    let options = ExecutorOptions::new("SELECT id, email FROM users ORDER BY id", url)
        .include_columns(false);

    let outcome = SqlExecutor::new().run(&options).await.unwrap();
    assert_eq!(
        outcome.text,
        r#"[[1,"alice@example.com"],[2,"bob@example.com"]]"#
    );
}

#[tokio::test]
async fn test_long_text_is_truncated() {
    let (_dir, url) = seeded_database().await;
    let long_bio = "lorem ipsum ".repeat(50);
    let update = format!("UPDATE users SET bio = '{long_bio}' WHERE id = 1");
    SqlExecutor::new()
        .run(&ExecutorOptions::new(update, url.clone()))
        .await
        .unwrap();

    let options = ExecutorOptions::new("SELECT bio FROM users WHERE id = 1", url)
        .include_columns(false);
    let outcome = SqlExecutor::new().run(&options).await.unwrap();

    let parsed: Vec<Vec<String>> = serde_json::from_str(&outcome.text).unwrap();
    let bio = &parsed[0][0];
    assert!(bio.chars().count() <= 300);
    assert!(bio.ends_with("..."));
    assert!(long_bio.starts_with(bio.trim_end_matches("...")));
}

#[tokio::test]
async fn test_statement_without_rows_yields_empty_array() {
    let (_dir, url) = seeded_database().await;
    let options = ExecutorOptions::new("DELETE FROM users WHERE id = 2", url);

    let outcome = SqlExecutor::new().run(&options).await.unwrap();
    assert_eq!(outcome.text, "[]");
}

#[tokio::test]
async fn test_bad_query_is_contained_with_passthrough() {
    let (_dir, url) = seeded_database().await;
    let query = "SELECT * FROM missing_table";

    let err = SqlExecutor::new()
        .run(&ExecutorOptions::new(query, url.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Query(_)));
    assert!(err.to_string().contains("missing_table"));

    let outcome = SqlExecutor::new()
        .run(&ExecutorOptions::new(query, url.clone()).passthrough(true))
        .await
        .unwrap();
    assert_eq!(outcome.text, query);

    let outcome = SqlExecutor::new()
        .run(&ExecutorOptions::new(query, url).passthrough(true).add_error(true))
        .await
        .unwrap();
    assert!(outcome.text.starts_with(&outcome.status));
    assert!(outcome.text.contains("\n\nError: Query("));
    assert!(outcome.text.ends_with("\n\nQuery: SELECT * FROM missing_table"));
}

#[tokio::test]
async fn test_unopenable_path_is_connection_error() {
    let options = ExecutorOptions::new("SELECT 1", "sqlite:///nonexistent-dir-xyz/sub/app.db")
        .passthrough(true);

    let err = SqlExecutor::new().run(&options).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Connection(_)));
}
