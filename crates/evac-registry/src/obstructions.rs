//! Currently blocked waypoints.
//!
//! Obstructions never expire; they stay until a caller clears them.
//!
//! Every add or remove bumps a generation counter.  A route planned against
//! [`ObstructionRegistry::snapshot`] is still valid to store as long as
//! [`ObstructionRegistry::generation`] has not moved since.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use evac_core::{Category, NodeId, SessionId, Severity, Timestamp};
use evac_spatial::Exclusion;

/// A reported blockage at one navigable waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstruction {
    pub waypoint:      NodeId,
    pub severity:      Severity,
    pub category:      Category,
    pub reporter:      Option<SessionId>,
    pub reporter_name: Option<String>,
    pub message:       String,
    pub reported_at:   Timestamp,
}

#[derive(Debug, Default)]
struct Inner {
    by_waypoint: BTreeMap<NodeId, Obstruction>,
    generation:  u64,
}

#[derive(Debug, Default)]
pub struct ObstructionRegistry {
    inner: RwLock<Inner>,
}

impl ObstructionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `obstruction`.  Returns `true` if the waypoint was not blocked
    /// before; a repeat report replaces the metadata and returns `false`.
    pub fn add(&self, obstruction: Obstruction) -> bool {
        let waypoint = obstruction.waypoint;
        let severity = obstruction.severity;
        let mut inner = self.inner.write();
        let fresh = inner.by_waypoint.insert(waypoint, obstruction).is_none();
        inner.generation += 1;
        debug!(waypoint = waypoint.0, severity = %severity, fresh, generation = inner.generation, "obstruction_stored");
        fresh
    }

    /// Clear `waypoint`.  `None` if it was not blocked.
    pub fn remove(&self, waypoint: NodeId) -> Option<Obstruction> {
        let mut inner = self.inner.write();
        let removed = inner.by_waypoint.remove(&waypoint);
        if removed.is_some() {
            inner.generation += 1;
            debug!(waypoint = waypoint.0, generation = inner.generation, "obstruction_removed");
        }
        removed
    }

    /// Every blocked waypoint, ready to pass to the router.
    pub fn blocked_set(&self) -> Exclusion {
        self.inner.read().by_waypoint.keys().copied().collect()
    }

    /// The blocked set together with the generation it belongs to, taken
    /// under one read lock.
    pub fn snapshot(&self) -> (u64, Exclusion) {
        let inner = self.inner.read();
        (inner.generation, inner.by_waypoint.keys().copied().collect())
    }

    /// Number of changes so far.  Starts at 0.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    pub fn is_blocked(&self, waypoint: NodeId) -> bool {
        self.inner.read().by_waypoint.contains_key(&waypoint)
    }

    pub fn get(&self, waypoint: NodeId) -> Option<Obstruction> {
        self.inner.read().by_waypoint.get(&waypoint).cloned()
    }

    /// All obstructions in waypoint order.
    pub fn all(&self) -> Vec<Obstruction> {
        self.inner.read().by_waypoint.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_waypoint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_waypoint.is_empty()
    }
}
