//! Error types for evac-report.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportError {
    /// The language client could not be reached or refused the request.
    #[error("language client error: {0}")]
    Client(String),

    /// The client answered, but not with a usable JSON object.
    #[error("could not parse interpretation: {0}")]
    Parse(String),
}

/// Alias for `Result<T, ReportError>`.
pub type ReportResult<T> = Result<T, ReportError>;
