//! Configuration management for sqlrun.
//!
//! Holds the per-invocation options record and loads optional defaults and
//! named connections from a TOML file.

use crate::error::{ExecutorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Scheme alias rewritten before a URI is handed to the driver.
const POSTGRESQL_PREFIX: &str = "postgresql://";
const POSTGRES_PREFIX: &str = "postgres://";

/// Canonicalizes a connection URI.
///
/// Surrounding whitespace is removed and a leading `postgresql://` becomes
/// `postgres://`. Every other scheme is left alone.
pub fn clean_up_uri(uri: &str) -> String {
    let uri = uri.trim();
    match uri.strip_prefix(POSTGRESQL_PREFIX) {
        Some(rest) => format!("{POSTGRES_PREFIX}{rest}"),
        None => uri.to_string(),
    }
}

/// Options for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    /// SQL statement, passed verbatim to the database.
    pub query: String,

    /// Connection URI, normalized with [`clean_up_uri`] before use.
    pub database_url: String,

    /// Keep column names (objects) or drop them (arrays).
    #[serde(default = "default_include_columns")]
    pub include_columns: bool,

    /// Swallow execution failures instead of returning them as errors.
    #[serde(default)]
    pub passthrough: bool,

    /// Annotate a swallowed failure with the error; only used with `passthrough`.
    #[serde(default)]
    pub add_error: bool,
}

fn default_include_columns() -> bool {
    true
}

impl ExecutorOptions {
    /// Creates options with default flags.
    pub fn new(query: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            database_url: database_url.into(),
            include_columns: default_include_columns(),
            passthrough: false,
            add_error: false,
        }
    }

    /// Sets whether column names are kept.
    pub fn include_columns(mut self, include_columns: bool) -> Self {
        self.include_columns = include_columns;
        self
    }

    /// Sets whether execution failures are swallowed.
    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    /// Sets whether swallowed failures are annotated.
    pub fn add_error(mut self, add_error: bool) -> Self {
        self.add_error = add_error;
        self
    }

    /// Returns the normalized connection URI.
    pub fn normalized_url(&self) -> String {
        clean_up_uri(&self.database_url)
    }
}

/// Main configuration structure loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default flag values.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Named database connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// Flag defaults applied when the command line leaves them unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_include_columns")]
    pub include_columns: bool,

    #[serde(default)]
    pub passthrough: bool,

    #[serde(default)]
    pub add_error: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            include_columns: default_include_columns(),
            passthrough: false,
            add_error: false,
        }
    }
}

/// A named database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection URI.
    pub url: String,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlrun")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ExecutorError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ExecutorError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}
