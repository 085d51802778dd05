//! Error types for evac-coord.
//!
//! Session-facing failures use `EvacError` from `evac-core`, which carries
//! the wire [`ErrorCode`](evac_core::ErrorCode).  `CoordError` covers
//! service construction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordError {
    #[error("engine configuration error: {0}")]
    Config(String),
}

/// Alias for `Result<T, CoordError>`.
pub type CoordResult<T> = Result<T, CoordError>;
