//! Unified error hierarchy for CalTrak
//!
//! The calculation engine itself is infallible; these errors come from the
//! layers around it (validation, session history, import/export, config).

use std::path::PathBuf;
use thiserror::Error;

pub use crate::validation::ValidationError;

/// Top-level error type for all CalTrak operations
#[derive(Debug, Error)]
pub enum CaltrakError {
    /// Inputs outside accepted bounds
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session history errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Session store errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session with this id
    #[error("Session not found: {id}")]
    NotFound { id: String },

    /// History file could not be read or written
    #[error("Session history unavailable at {path}: {reason}")]
    Storage { path: PathBuf, reason: String },
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Row-level parse error
    #[error("Parse error in {format} at row {row}: {reason}")]
    ParseError {
        format: String,
        row: usize,
        reason: String,
    },

    /// Required column missing from the header
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}

impl From<csv::Error> for ImportExportError {
    fn from(err: csv::Error) -> Self {
        let row = err
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(0);
        ImportExportError::ParseError {
            format: "csv".to_string(),
            row,
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ImportExportError {
    fn from(err: serde_json::Error) -> Self {
        ImportExportError::ParseError {
            format: "json".to_string(),
            row: err.line(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for CalTrak operations
pub type Result<T> = std::result::Result<T, CaltrakError>;

impl CaltrakError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CaltrakError::Validation(_) => ErrorSeverity::Warning,
            CaltrakError::Session(SessionError::NotFound { .. }) => ErrorSeverity::Warning,
            CaltrakError::Session(_) => ErrorSeverity::Error,
            CaltrakError::ImportExport(_) => ErrorSeverity::Error,
            CaltrakError::Io(_) => ErrorSeverity::Error,
            CaltrakError::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CaltrakError::Validation(err) => {
                let issues: Vec<_> = err.issues.iter().map(|issue| issue.to_string()).collect();
                format!("Please check these fields: {}", issues.join("; "))
            }
            CaltrakError::Session(SessionError::NotFound { id }) => {
                format!("No saved calculation with id {}", id)
            }
            CaltrakError::ImportExport(ImportExportError::MissingColumn { column }) => {
                format!("The input file has no '{}' column", column)
            }
            _ => self.to_string(),
        }
    }

    /// Emit this error as a tracing event at its severity level
    pub fn log(&self, location: &str) {
        if self.severity().to_tracing_level() == tracing::Level::ERROR {
            tracing::error!(location, error = %self, "Operation failed");
        } else {
            tracing::warn!(location, error = %self, "Operation failed");
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
