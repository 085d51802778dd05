//! `evac-core` — foundational types for the evac routing engine.
//!
//! This crate is a dependency of every other `evac-*` crate.  It has no
//! `evac-*` dependencies and only a handful of external ones (`serde`,
//! `chrono`, `thiserror`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                        |
//! |------------|-----------------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `EdgeId`, `SessionId`                                 |
//! | [`geo`]    | `Point` (planar plan coordinates), Euclidean distance, turns    |
//! | [`kinds`]  | `WaypointKind`, `Severity`, `Category`, `OccupantStatus`, `ErrorCode` |
//! | [`time`]   | `Timestamp` alias and `now()`                                   |
//! | [`error`]  | `EvacError`, `EvacResult`                                       |

pub mod error;
pub mod geo;
pub mod ids;
pub mod kinds;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{EvacError, EvacResult};
pub use geo::Point;
pub use ids::{EdgeId, NodeId, SessionId};
pub use kinds::{Category, ErrorCode, OccupantStatus, Severity, WaypointKind};
pub use time::{Timestamp, now};
