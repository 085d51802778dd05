//! `evac-registry` — the engine's shared mutable state.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`occupants`]    | `Occupant`, `OccupantRegistry`                             |
//! | [`obstructions`] | `Obstruction`, `ObstructionRegistry`                       |
//! | [`mirror`]       | `StateMirror` trait, `NoopMirror`, `MemoryMirror`, key helpers |
//! | `sqlite`         | `SqliteMirror` (feature `sqlite`)                          |
//! | [`error`]        | `RegistryError`, `RegistryResult<T>`                       |
//!
//! # Concurrency
//!
//! Each registry wraps its map in a single `parking_lot::RwLock`.  Every
//! public method takes the lock exactly once, so each mutation is atomic
//! relative to every other one, and snapshots are consistent copies taken
//! under one read lock.  Updates addressed to a session that is no longer
//! present are silently dropped, which is what makes a disconnect racing a
//! reroute harmless.

pub mod error;
pub mod mirror;
pub mod obstructions;
pub mod occupants;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use error::{RegistryError, RegistryResult};
pub use mirror::{
    MemoryMirror, NoopMirror, StateMirror, delete_logged, obstruction_key, occupant_key, put_json,
};
pub use obstructions::{Obstruction, ObstructionRegistry};
pub use occupants::{Occupant, OccupantRegistry};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteMirror;
