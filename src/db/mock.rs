//! Mock database clients for testing.
//!
//! Provides in-memory implementations that return predefined rows or errors.

use super::{DatabaseBackend, DatabaseClient, Row};
use crate::error::{ExecutorError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A mock database client that returns predefined rows for every statement.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    rows: Vec<Row>,
    executed: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MockDatabaseClient {
    /// Creates a new mock database client that returns no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock database client that returns the given rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Returns the statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        self.executed
            .lock()
            .map_err(|_| ExecutorError::internal("mock statement log poisoned"))?
            .push(sql.to_string());
        Ok(self.rows.clone())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }
}

/// A mock database client whose statements always fail with the same error.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    error: ExecutorError,
    closed: AtomicBool,
}

impl FailingDatabaseClient {
    /// Creates a client that fails every statement with `error`.
    pub fn new(error: ExecutorError) -> Self {
        Self {
            error,
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a client that fails every statement with a query error.
    pub fn with_message(msg: impl Into<String>) -> Self {
        Self::new(ExecutorError::query(msg))
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn fetch_rows(&self, _sql: &str) -> Result<Vec<Row>> {
        Err(self.error.clone())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }
}
