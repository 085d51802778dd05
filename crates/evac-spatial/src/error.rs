//! Spatial-subsystem error type.

use thiserror::Error;

use evac_core::NodeId;

/// Errors produced by `evac-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("unknown waypoint {0:?}")]
    UnknownWaypoint(String),

    #[error("waypoint {0:?} is not navigable")]
    NotNavigable(String),

    #[error("node {0} is not a navigable waypoint")]
    InvalidNode(NodeId),

    #[error("duplicate waypoint {0:?}")]
    DuplicateWaypoint(String),

    #[error("room {0:?} cannot be marked navigable")]
    NavigableRoom(String),

    #[error("corridor from {0:?} to itself")]
    SelfLoop(String),

    #[error("map parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpatialError {
    /// `true` for the errors a caller reports as `INVALID_NODE`.
    pub fn is_invalid_node(&self) -> bool {
        matches!(
            self,
            SpatialError::UnknownWaypoint(_)
                | SpatialError::NotNavigable(_)
                | SpatialError::InvalidNode(_)
        )
    }
}

pub type SpatialResult<T> = Result<T, SpatialError>;
