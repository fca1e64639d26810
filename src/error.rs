// ⚠️ Error Taxonomy
// Not-found is a normal empty result; only unavailable sources and bad rows are errors

use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, FinanceError>;

#[derive(Error, Debug)]
pub enum FinanceError {
    /// Candidate, committee or contributor absent (callers usually get `Ok(None)` instead)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backing store or remote API unreachable or erroring
    #[error("{service} unavailable: {message}")]
    DataSourceUnavailable { service: String, message: String },

    /// A source row failed to parse; skipped by loaders
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FinanceError {
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        FinanceError::DataSourceUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// True for failures of the store or a remote collaborator
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            FinanceError::DataSourceUnavailable { .. } | FinanceError::Database(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        let err = FinanceError::unavailable("openfec", "HTTP 503");
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "openfec unavailable: HTTP 503");

        let err = FinanceError::MalformedRecord {
            line: 7,
            reason: "non-numeric amount".to_string(),
        };
        assert!(!err.is_unavailable());

        let err: FinanceError = rusqlite::Error::InvalidQuery.into();
        assert!(err.is_unavailable());
    }
}
