//! Database abstraction layer for sqlrun.
//!
//! Provides a trait-based interface for running a statement and pulling its
//! rows into memory, allowing different database backends to be used
//! interchangeably.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{Row, Value};

use crate::error::{ExecutorError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Maximum number of connection retry attempts.
pub(crate) const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
pub(crate) const RETRY_BASE_DELAY_MS: u64 = 500;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a URL scheme.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Detects the backend from a connection URI.
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .filter(|scheme| !scheme.is_empty())
            .ok_or_else(|| ExecutorError::connection(format!("Invalid database URL: '{url}'")))?;

        Self::parse(scheme).ok_or_else(|| {
            ExecutorError::connection(format!(
                "Unsupported database scheme '{scheme}'. Expected 'postgres', 'postgresql' or 'sqlite'"
            ))
        })
    }
}

/// Opens a client for the database identified by `url`.
///
/// This is the central factory function for database connections. Every
/// failure here is a [`ExecutorError::Connection`].
pub async fn connect(url: &str) -> Result<Box<dyn DatabaseClient>> {
    let backend = DatabaseBackend::from_url(url)?;
    debug!("Connecting to {} database at {}", backend.as_str(), redact_url(url));

    match backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(url).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(url).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with ExecutorError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Runs a SQL statement and materializes every row it returns.
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;

    /// Returns the dialect this client talks to.
    fn backend(&self) -> DatabaseBackend;
}

/// Returns a display-safe form of a connection URL (password masked).
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        Ok(parsed) => parsed.to_string(),
        Err(_) => "<invalid url>".to_string(),
    }
}

/// Retries `attempt_fn` on transient failures with exponential backoff.
///
/// Shared by the sqlx-backed clients; `is_transient` decides whether an
/// error is worth another attempt.
pub(crate) async fn connect_with_retry<T, F, Fut>(
    mut attempt_fn: F,
    is_transient: fn(&sqlx::Error) -> bool,
) -> std::result::Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
    let mut attempt = 1;

    loop {
        debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

        match attempt_fn().await {
            Ok(value) => {
                debug!("Successfully connected to database");
                return Ok(value);
            }
            Err(e) if attempt < MAX_RETRY_ATTEMPTS && is_transient(&e) => {
                warn!(
                    "Connection attempt {} failed (transient error), retrying in {:?}",
                    attempt, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2; // Exponential backoff
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
