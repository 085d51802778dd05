//! `evac-spatial` — waypoint graph, routing, exit selection, and directions.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`graph`]      | `WaypointGraph` (CSR + R-tree), `WaypointGraphBuilder`        |
//! | [`router`]     | `Router` trait, `Route`, `AStarRouter`, `Exclusion`           |
//! | [`exits`]      | `ExitSelector`, `ExitLoad`, `ExitScore`                       |
//! | [`directions`] | `DirectionSynthesizer`, `Instruction`, `Turn`                 |
//! | [`loader`]     | `load_graph_csv` / `load_graph_reader`                        |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                            |
//!
//! The graph is immutable once built, so every query here is a pure function
//! of `(graph, inputs)` and may run on any number of threads at once.

pub mod directions;
pub mod error;
pub mod exits;
pub mod graph;
pub mod loader;
pub mod router;

#[cfg(test)]
mod tests;

pub use directions::{DirectionSynthesizer, Instruction, Turn};
pub use error::{SpatialError, SpatialResult};
pub use exits::{ExitLoad, ExitScore, ExitSelector};
pub use graph::{WaypointGraph, WaypointGraphBuilder, WaypointSpec};
pub use loader::{load_graph_csv, load_graph_reader};
pub use router::{AStarRouter, Exclusion, Route, Router};
