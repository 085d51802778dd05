//! Error types for evac-registry.

use thiserror::Error;

/// Failures of the write-through mirror.  The registries themselves never
/// fail; only persisting a copy of their state can.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Alias for `Result<T, RegistryError>`.
pub type RegistryResult<T> = Result<T, RegistryError>;
