//! Error containment policy.
//!
//! Decides, once per invocation, what a failed execution turns into.

use crate::error::{ExecutorError, Result};
use serde::Serialize;

/// Final result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    /// Text handed back to the caller.
    pub text: String,
    /// Text recorded on the status surface. Equals `text` on success and
    /// holds the error message when a failure was swallowed.
    pub status: String,
    /// True when a failure was swallowed to produce `text`.
    pub contained: bool,
}

impl ExecutionOutcome {
    /// A successful payload.
    pub fn success(payload: String) -> Self {
        Self {
            status: payload.clone(),
            text: payload,
            contained: false,
        }
    }
}

/// Containment settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainmentPolicy {
    /// Swallow failures instead of returning them.
    pub passthrough: bool,
    /// Annotate swallowed failures with the error and the query.
    pub add_error: bool,
}

impl ContainmentPolicy {
    pub fn new(passthrough: bool, add_error: bool) -> Self {
        Self {
            passthrough,
            add_error,
        }
    }

    /// Resolves the outcome of the failure domain.
    ///
    /// - success: the payload
    /// - failure without passthrough: the original error
    /// - failure with passthrough and add_error: message, error and query
    /// - failure with passthrough only: the query, verbatim
    ///
    /// Connection failures are never swallowed, whatever the settings.
    pub fn resolve(&self, result: Result<String>, query: &str) -> Result<ExecutionOutcome> {
        let error = match result {
            Ok(payload) => return Ok(ExecutionOutcome::success(payload)),
            Err(error) => error,
        };

        if !self.passthrough || !error.is_containable() {
            return Err(error);
        }

        let status = error.to_string();
        let text = if self.add_error {
            annotate(&error, query)
        } else {
            query.to_string()
        };

        Ok(ExecutionOutcome {
            text,
            status,
            contained: true,
        })
    }
}

/// Formats a swallowed failure as `"{message}\n\nError: {repr}\n\nQuery: {query}"`.
pub fn annotate(error: &ExecutorError, query: &str) -> String {
    format!("{error}\n\nError: {error:?}\n\nQuery: {query}")
}
