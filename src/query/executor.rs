//! Single-statement execution pipeline.
//!
//! Connects, runs the statement, normalizes and serializes the rows, then
//! hands the result to the containment policy. Can be tested independently
//! of any real database through [`SqlExecutor::run_with_client`].

use crate::config::ExecutorOptions;
use crate::db::{self, DatabaseClient};
use crate::error::Result;
use crate::query::containment::{ContainmentPolicy, ExecutionOutcome};
use crate::query::{normalize, projection, serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs one statement per call; holds no state between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlExecutor;

impl SqlExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Connects to `options.database_url` and runs `options.query`.
    ///
    /// Connection failures are always returned as errors. Everything after
    /// the connection is open goes through the containment policy. The
    /// connection is closed before returning.
    pub async fn run(&self, options: &ExecutorOptions) -> Result<ExecutionOutcome> {
        let url = options.normalized_url();
        let client = db::connect(&url).await?;
        info!(
            "Connected to {} at {}",
            client.backend().as_str(),
            db::redact_url(&url)
        );

        let outcome = self.run_with_client(client.as_ref(), options).await;

        if let Err(e) = client.close().await {
            warn!("Failed to close connection: {}", e);
        }

        outcome
    }

    /// Runs `options.query` on an already open client.
    ///
    /// The client is left open.
    pub async fn run_with_client(
        &self,
        client: &dyn DatabaseClient,
        options: &ExecutorOptions,
    ) -> Result<ExecutionOutcome> {
        let start = Instant::now();
        let payload = fetch_and_render(client, options).await;
        debug!("Statement finished in {:?}", start.elapsed());

        let policy = ContainmentPolicy::new(options.passthrough, options.add_error);
        let outcome = policy.resolve(payload, &options.query)?;

        if outcome.contained {
            warn!("Query failed, returning passthrough output: {}", outcome.status);
        }
        debug!(status = %outcome.status, "SqlExecutor result");

        Ok(outcome)
    }
}

/// The failure domain: fetch, normalize, project, serialize.
async fn fetch_and_render(client: &dyn DatabaseClient, options: &ExecutorOptions) -> Result<String> {
    let rows = client.fetch_rows(&options.query).await?;
    debug!("Normalizing {} rows", rows.len());

    let rows = normalize::normalize_rows(rows);
    let rows = projection::project_rows(rows, options.include_columns);
    serialize::to_json(&rows)
}
