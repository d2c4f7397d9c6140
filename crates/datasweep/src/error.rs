//! Custom error types for the data cleaning agent.
//!
//! This module provides a comprehensive error hierarchy using `thiserror`.
//! Library errors are reserved for engine and programming failures; expected
//! data conditions (nothing to deduplicate, no numeric columns, ...) are
//! reported through [`crate::types::Outcome`] instead and never surface here.
//!
//! Errors are serializable so they can be embedded in JSON reports emitted
//! by the CLI.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning agent.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Data profiling failed.
    #[error("Failed to profile dataset: {0}")]
    ProfilingFailed(String),

    /// A cleaning operation raised an internal failure (not a data condition).
    #[error("Operation '{operation}' failed: {reason}")]
    OperationFailed { operation: String, reason: String },

    /// Unknown operation name requested from the registry.
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// Oracle client error (transport, timeout or unusable reply).
    #[error("Oracle error: {0}")]
    OracleError(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// Internal error (e.g., an invariant broken by a bug).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error (for the oracle client, only with "ai" feature).
    #[cfg(feature = "ai")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SweepError>,
    },
}

impl SweepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SweepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for report embedding.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::ProfilingFailed(_) => "PROFILING_FAILED",
            Self::OperationFailed { .. } => "OPERATION_FAILED",
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::OracleError(_) => "ORACLE_ERROR",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is recoverable by failing over to a rule-based
    /// strategy (oracle problems are, engine failures are not).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::OracleError(_) | Self::InvalidConfig(_) => true,
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields,
/// making them easy to embed in a JSON report.
impl Serialize for SweepError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("SweepError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, SweepError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SweepError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            SweepError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            SweepError::OracleError("down".to_string()).error_code(),
            "ORACLE_ERROR"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(SweepError::OracleError("timeout".to_string()).is_recoverable());
        assert!(!SweepError::Internal("bug".to_string()).is_recoverable());
        assert!(
            SweepError::OracleError("timeout".to_string())
                .with_context("During planning")
                .is_recoverable()
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = SweepError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = SweepError::ColumnNotFound("test".to_string()).with_context("During profiling");
        assert!(error.to_string().contains("During profiling"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // Preserves original code
    }
}
