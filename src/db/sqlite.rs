//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for SQLite files and in-memory databases using sqlx.

use crate::db::{connect_with_retry, DatabaseBackend, DatabaseClient, Row, Value};
use crate::error::{ExecutorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Creates a new SqliteClient from an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the database at `url` (`sqlite::memory:`, `sqlite://path.db`, ...).
    ///
    /// The file is created if it does not exist yet.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| ExecutorError::connection(format!("Invalid database path: {e}")))?
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        // A single connection keeps `:memory:` databases alive for the whole run.
        let pool = connect_with_retry(
            || {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect_with(options.clone())
            },
            is_transient_error,
        )
        .await
        .map_err(|e| ExecutorError::connection(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let mut stream = sqlx::query(sql).fetch(&self.pool);
        let mut rows = Vec::new();

        while let Some(row) = stream
            .try_next()
            .await
            .map_err(|e| ExecutorError::query(format_query_error(e)))?
        {
            rows.push(convert_row(&row));
        }

        debug!("Fetched {} rows", rows.len());
        Ok(rows)
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    let mut converted = Row::with_capacity(row.len());
    for (i, col) in row.columns().iter().enumerate() {
        converted.insert(col.name(), convert_value(row, i, col.type_info().name()));
    }
    converted
}

/// Converts a single column value from a SqliteRow to our Value type.
///
/// SQLite is dynamically typed, so the declared column type is only a hint;
/// when it does not decode, the storage class decides.
fn convert_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "NULL" => Value::Null,

        "BOOLEAN" | "BOOL" => decode::<bool>(row, index)
            .map(Value::Bool)
            .unwrap_or_else(|| decode_dynamic(row, index)),

        // SQLite typically stores instants as text or unix seconds
        "DATETIME" | "TIMESTAMP" => decode::<DateTime<Utc>>(row, index)
            .or_else(|| decode::<NaiveDateTime>(row, index).map(|ts| ts.and_utc()))
            .map(Value::Timestamp)
            .unwrap_or_else(|| decode_dynamic(row, index)),

        _ => decode_dynamic(row, index),
    }
}

/// Decodes a value by trying storage classes in order of preference.
fn decode_dynamic(row: &SqliteRow, index: usize) -> Value {
    if let Some(v) = decode::<i64>(row, index) {
        Value::Int(v)
    } else if let Some(v) = decode::<f64>(row, index) {
        Value::Float(v)
    } else if let Some(v) = decode::<String>(row, index) {
        Value::String(v)
    } else if let Some(v) = decode::<Vec<u8>>(row, index) {
        Value::Bytes(v)
    } else {
        Value::Null
    }
}

/// Decodes a nullable column; undecodable values are treated as NULL.
fn decode<'r, T>(row: &'r SqliteRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

/// Lock contention is the only transient failure for a local file.
fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();
    error_str.contains("database is locked") || error_str.contains("timed out")
}

fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
