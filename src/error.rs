//! Error types for sqlrun.
//!
//! Defines the main error enum used throughout the pipeline.

use thiserror::Error;

/// Main error type for sqlrun operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    /// Database connection errors (malformed URI, host unreachable, auth failed, etc.)
    ///
    /// Never contained by the passthrough policy.
    #[error("An error occurred while connecting to the database: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, row decoding, etc.)
    #[error("{0}")]
    Query(String),

    /// A normalized value could not be encoded as JSON.
    #[error("{0}")]
    Serialization(String),

    /// Configuration errors (invalid config file, missing connection, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExecutorError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Serialization(_) => "Serialization Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the passthrough policy may swallow this error.
    ///
    /// Everything raised between query execution and serialization is
    /// containable; failing to connect is not.
    pub fn is_containable(&self) -> bool {
        matches!(self, Self::Query(_) | Self::Serialization(_))
    }
}

/// Result type alias using ExecutorError.
pub type Result<T> = std::result::Result<T, ExecutorError>;
