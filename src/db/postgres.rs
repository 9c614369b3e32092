//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::db::{connect_with_retry, DatabaseBackend, DatabaseClient, Row, Value};
use crate::error::{ExecutorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use sqlx::postgres::types::{Oid, PgInterval};
use sqlx::postgres::{PgConnectOptions, PgHasArrayType, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Creates a new PostgresClient from an existing connection pool.
    ///
    /// This is primarily useful for testing.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`, retrying transient failures.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| ExecutorError::connection(format!("Invalid connection string: {e}")))?;

        let result = connect_with_retry(
            || {
                PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect_with(options.clone())
            },
            is_transient_error,
        )
        .await;

        match result {
            Ok(pool) => Ok(Self { pool }),
            Err(e) => Err(map_connection_error(e, &options)),
        }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let mut stream = sqlx::query(sql).fetch(&self.pool);
        let mut rows = Vec::new();

        while let Some(row) = stream
            .try_next()
            .await
            .map_err(|e| ExecutorError::query(format_query_error(e)))?
        {
            rows.push(convert_row(&row)?);
        }

        debug!("Fetched {} rows", rows.len());
        Ok(rows)
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    let mut converted = Row::with_capacity(row.len());
    for (i, col) in row.columns().iter().enumerate() {
        let type_name = col.type_info().name();
        let value = convert_value(row, i, type_name).map_err(|e| {
            ExecutorError::query(format!(
                "Cannot decode column '{}' of type {type_name}: {e}",
                col.name()
            ))
        })?;
        converted.insert(col.name(), value);
    }
    Ok(converted)
}

/// Converts a single column value from a PgRow to our Value type.
///
/// NULL decodes as `Value::Null` for every type. A non-NULL value whose type
/// has no mapping is an error, never a silent NULL.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> DecodeResult<Value> {
    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => decode::<bool>(row, index)?.into(),

        "INT2" | "SMALLINT" => decode::<i16>(row, index)?.map(i64::from).into(),

        "INT4" | "INT" | "INTEGER" => decode::<i32>(row, index)?.map(i64::from).into(),

        "INT8" | "BIGINT" => decode::<i64>(row, index)?.into(),

        "OID" => decode::<Oid>(row, index)?.map(|oid| i64::from(oid.0)).into(),

        "FLOAT4" | "REAL" => decode::<f32>(row, index)?.map(f64::from).into(),

        "FLOAT8" | "DOUBLE PRECISION" => decode::<f64>(row, index)?.into(),

        // Kept as text so no precision is lost.
        "NUMERIC" => decode::<Decimal>(row, index)?.map(|d| d.to_string()).into(),

        "UUID" => decode::<Uuid>(row, index)?.map(|u| u.to_string()).into(),

        "BYTEA" => decode::<Vec<u8>>(row, index)?.into(),

        "TIMESTAMPTZ" => decode::<DateTime<Utc>>(row, index)?.into(),

        "TIMESTAMP" => decode::<NaiveDateTime>(row, index)?
            .map(|ts| ts.and_utc())
            .into(),

        // Dates, times of day and durations are not instants; keep their text form.
        "DATE" => decode::<NaiveDate>(row, index)?
            .map(|d| d.to_string())
            .into(),

        "TIME" => decode::<NaiveTime>(row, index)?
            .map(|t| t.to_string())
            .into(),

        "INTERVAL" => decode::<PgInterval>(row, index)?
            .map(|i| format_interval(&i))
            .into(),

        "JSON" | "JSONB" => decode::<serde_json::Value>(row, index)?
            .map(|v| v.to_string())
            .into(),

        "VOID" => Value::Null,

        "BOOL[]" => decode_array::<bool>(row, index, Value::Bool)?,
        "INT2[]" => decode_array::<i16>(row, index, |n| Value::Int(n.into()))?,
        "INT4[]" => decode_array::<i32>(row, index, |n| Value::Int(n.into()))?,
        "INT8[]" => decode_array::<i64>(row, index, Value::Int)?,
        "FLOAT4[]" => decode_array::<f32>(row, index, |n| Value::Float(n.into()))?,
        "FLOAT8[]" => decode_array::<f64>(row, index, Value::Float)?,
        "NUMERIC[]" => decode_array::<Decimal>(row, index, |d| Value::String(d.to_string()))?,
        "UUID[]" => decode_array::<Uuid>(row, index, |u| Value::String(u.to_string()))?,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            decode_array::<String>(row, index, Value::String)?
        }

        // Text-like types (TEXT, VARCHAR, NAME, ...) and anything else that
        // sqlx accepts as a string.
        _ => decode::<String>(row, index)?.into(),
    };
    Ok(value)
}

type DecodeResult<T> = std::result::Result<T, sqlx::Error>;

/// Decodes a nullable column.
fn decode<'r, T>(row: &'r PgRow, index: usize) -> DecodeResult<Option<T>>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<Option<T>, _>(index)
}

/// Decodes a nullable one-dimensional array column, mapping each non-NULL element.
fn decode_array<T>(row: &PgRow, index: usize, element: fn(T) -> Value) -> DecodeResult<Value>
where
    T: for<'a> sqlx::Decode<'a, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + PgHasArrayType,
{
    let items = decode::<Vec<Option<T>>>(row, index)?;
    Ok(match items {
        Some(items) => Value::Array(
            items
                .into_iter()
                .map(|item| item.map_or(Value::Null, element))
                .collect(),
        ),
        None => Value::Null,
    })
}

/// Renders an interval the way PostgreSQL prints it by default,
/// e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn format_interval(interval: &PgInterval) -> String {
    let mut parts = Vec::new();
    let fields = [
        (interval.months / 12, "year"),
        (interval.months % 12, "mon"),
        (interval.days, "day"),
    ];
    for (amount, unit) in fields {
        if amount != 0 {
            let plural = if amount == 1 { "" } else { "s" };
            parts.push(format!("{amount} {unit}{plural}"));
        }
    }

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        let fraction = micros % 1_000_000;
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    // Authentication and database-not-found errors are not transient
    if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
        || error_str.contains("does not exist")
        || error_str.contains("ssl")
        || error_str.contains("tls")
    {
        return false;
    }

    // Connection refused or timeout are often transient
    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, options: &PgConnectOptions) -> ExecutorError {
    let host = options.get_host();
    let port = options.get_port();
    let user = options.get_username();
    let database = options.get_database().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ExecutorError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        ExecutorError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        ExecutorError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        ExecutorError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ExecutorError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ExecutorError::connection(error.to_string())
    }
}

/// Formats a query error with the server's detail and hint fields when available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        let fields = [
            ("DETAIL", pg_error.detail()),
            ("HINT", pg_error.hint()),
            ("TABLE", pg_error.table()),
            ("COLUMN", pg_error.column()),
            ("CONSTRAINT", pg_error.constraint()),
        ];

        for (label, value) in fields {
            if let Some(value) = value {
                result.push_str("\n  ");
                result.push_str(label);
                result.push_str(": ");
                result.push_str(value);
            }
        }
    }

    result
}
