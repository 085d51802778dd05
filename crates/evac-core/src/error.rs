//! Engine-wide error taxonomy.
//!
//! Sub-crates define their own error enums and convert into `EvacError`
//! where a caller needs the session-facing [`ErrorCode`].

use thiserror::Error;

use crate::{ErrorCode, SessionId};

/// The three recoverable failures every operation can report back to the
/// originating session, plus the unknown-session case.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvacError {
    #[error("invalid waypoint: {0}")]
    InvalidNode(String),

    #[error("no evacuation route available from {0}")]
    NoRoute(String),

    #[error("could not resolve blockage report: {0}")]
    MalformedReport(String),

    #[error("session {0} has not joined")]
    UnknownSession(SessionId),
}

impl EvacError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EvacError::InvalidNode(_)     => ErrorCode::InvalidNode,
            EvacError::NoRoute(_)         => ErrorCode::NoRoute,
            EvacError::MalformedReport(_) => ErrorCode::MalformedReport,
            EvacError::UnknownSession(_)  => ErrorCode::UnknownSession,
        }
    }
}

/// Shorthand result type for session-facing operations.
pub type EvacResult<T> = Result<T, EvacError>;
