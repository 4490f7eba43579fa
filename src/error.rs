use std::fmt;
use thiserror::Error;

use crate::model::DbNum;

/// Errors surfaced by the translation core.
///
/// The core only distinguishes "stop now" from "continue with a partial
/// result"; domain errors (not found, invalid argument, ...) belong to the
/// callbacks and travel inside [`XlateError::Callback`].
#[derive(Debug, Error)]
pub enum XlateError {
    #[error("callback '{name}' failed at '{path}': {source}")]
    Callback {
        name: String,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("callback '{0}' is not registered")]
    CallbackNotRegistered(String),

    #[error("callback '{name}' is registered as {actual}, expected {expected}")]
    CallbackKindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("table dependency ordering failed: {0}")]
    DependencyOrdering(String),

    #[error("table dependency cycle through '{table}'")]
    DependencyCycle { table: String },

    #[error("value transform failed for {} table scope(s): {}", .failures.len(), display_failures(.failures))]
    ValueTransform { failures: Vec<ScopeFailure> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A transform failure confined to one database/table scope
#[derive(Debug)]
pub struct ScopeFailure {
    pub db: DbNum,
    pub table: String,
    pub error: anyhow::Error,
}

impl fmt::Display for ScopeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.db, self.table, self.error)
    }
}

fn display_failures(failures: &[ScopeFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, XlateError>;

impl XlateError {
    pub fn callback(name: &str, path: &str, source: anyhow::Error) -> Self {
        XlateError::Callback {
            name: name.to_string(),
            path: path.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = XlateError::callback("intf_key_xfmr", "/a/b[k=1]", anyhow::anyhow!("boom"));
        assert_eq!(
            err.to_string(),
            "callback 'intf_key_xfmr' failed at '/a/b[k=1]': boom"
        );

        let err = XlateError::ValueTransform {
            failures: vec![ScopeFailure {
                db: DbNum::ConfigDb,
                table: "PORT".to_string(),
                error: anyhow::anyhow!("bad alias"),
            }],
        };
        assert_eq!(
            err.to_string(),
            "value transform failed for 1 table scope(s): CONFIG_DB/PORT: bad alias"
        );
    }
}
