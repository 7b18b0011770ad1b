//! Error kinds for the dashboard.
//!
//! An empty result set is never an error: zero rows is a valid state that
//! every view renders as empty.

use thiserror::Error;

/// Failures while fetching or projecting warehouse data.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The warehouse cannot be reached. Fatal to the render.
    #[error("warehouse unreachable: {0}")]
    Connection(#[source] sqlx::Error),

    /// A query was rejected or its result did not match the expected schema.
    #[error("query '{query}' failed: {source}")]
    Query {
        query: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The warehouse did not answer within the configured timeout.
    #[error("query '{query}' timed out after {seconds}s")]
    Timeout { query: &'static str, seconds: u64 },

    /// A value could not be coerced to the type a view needs.
    #[error("row {row}: column '{column}' value {value:?} is not a number")]
    TypeCoercion {
        row: usize,
        column: &'static str,
        value: String,
    },
}

impl DashboardError {
    /// Classify a sqlx error raised while running `query`.
    pub fn from_sqlx(query: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => DashboardError::Connection(err),
            other => DashboardError::Query {
                query,
                source: other,
            },
        }
    }

    /// Short machine-readable kind, used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Connection(_) => "connection",
            DashboardError::Query { .. } => "query",
            DashboardError::Timeout { .. } => "timeout",
            DashboardError::TypeCoercion { .. } => "type_coercion",
        }
    }

    /// Whether the failure means the data source itself is unavailable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DashboardError::Connection(_) | DashboardError::Timeout { .. }
        )
    }
}

/// Invalid filter selections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A level was set while one of its ancestors was unset.
    #[error("cannot select {level} before {missing}")]
    AncestorUnset {
        level: &'static str,
        missing: &'static str,
    },

    /// The date parameter is not a `YYYY-MM-DD` calendar date.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connection_failures() {
        let err = DashboardError::from_sqlx("trend", sqlx::Error::PoolClosed);
        assert_eq!(err.kind(), "connection");
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_row_not_found_is_query_failure() {
        let err = DashboardError::from_sqlx("trend", sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), "query");
        assert!(!err.is_unavailable());
        assert!(err.to_string().contains("'trend'"));
    }

    #[test]
    fn test_filter_error_message() {
        let err = FilterError::AncestorUnset {
            level: "city",
            missing: "state",
        };
        assert_eq!(err.to_string(), "cannot select city before state");
    }
}
