//! Per-session occupant state.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use evac_core::{NodeId, OccupantStatus, SessionId, Timestamp, now};
use evac_spatial::ExitLoad;

// ── Occupant ──────────────────────────────────────────────────────────────────

/// One connected session's evacuation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupant {
    pub session:     SessionId,
    pub name:        String,
    pub current:     NodeId,
    /// Assigned route, start to exit.  Empty when none could be computed.
    pub route:       Vec<NodeId>,
    /// Index into `route` reported by the client.
    pub progress:    usize,
    pub status:      OccupantStatus,
    /// Set when a reroute failed and `route` still crosses an obstruction.
    pub route_stale: bool,
    pub joined_at:   Timestamp,
    pub last_update: Timestamp,
}

impl Occupant {
    fn new(session: SessionId, name: String, start: NodeId) -> Self {
        let t = now();
        Self {
            session,
            name,
            current:     start,
            route:       Vec::new(),
            progress:    0,
            status:      OccupantStatus::Active,
            route_stale: false,
            joined_at:   t,
            last_update: t,
        }
    }

    /// Exit the assigned route ends at.
    pub fn destination(&self) -> Option<NodeId> {
        self.route.last().copied()
    }

    pub fn route_contains(&self, node: NodeId) -> bool {
        self.route.contains(&node)
    }

    pub fn is_active(&self) -> bool {
        self.status == OccupantStatus::Active
    }
}

// ── OccupantRegistry ──────────────────────────────────────────────────────────

/// All connected occupants, keyed (and therefore snapshotted) in
/// `SessionId` order.
#[derive(Debug, Default)]
pub struct OccupantRegistry {
    inner: RwLock<BTreeMap<SessionId, Occupant>>,
}

impl OccupantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` at `start`.  A second join from the same session
    /// replaces the earlier record.
    pub fn create(&self, session: SessionId, name: impl Into<String>, start: NodeId) -> Occupant {
        let occupant = Occupant::new(session.clone(), name.into(), start);
        let replaced = self.inner.write().insert(session.clone(), occupant.clone()).is_some();
        debug!(session = %session, start = start.0, replaced, "occupant_created");
        occupant
    }

    /// Record a position report.  Reaching the last waypoint of the assigned
    /// route marks the occupant ARRIVED.  Returns the updated record, or
    /// `None` if the session is gone.
    pub fn update_position(&self, session: &SessionId, waypoint: NodeId, progress: usize) -> Option<Occupant> {
        let mut map = self.inner.write();
        let occupant = map.get_mut(session)?;
        occupant.current     = waypoint;
        occupant.progress    = progress;
        occupant.last_update = now();
        if occupant.is_active() && occupant.destination() == Some(waypoint) {
            occupant.status = OccupantStatus::Arrived;
            debug!(session = %session, exit = waypoint.0, "occupant_arrived");
        }
        Some(occupant.clone())
    }

    /// Assign a fresh route.  Resets progress and clears the stale flag.
    /// Returns `false` if the session is gone.
    pub fn update_route(&self, session: &SessionId, route: Vec<NodeId>) -> bool {
        let mut map = self.inner.write();
        let Some(occupant) = map.get_mut(session) else {
            debug!(session = %session, "route_update_dropped");
            return false;
        };
        occupant.status = if route.len() == 1 && route[0] == occupant.current {
            OccupantStatus::Arrived
        } else {
            OccupantStatus::Active
        };
        occupant.route       = route;
        occupant.progress    = 0;
        occupant.route_stale = false;
        occupant.last_update = now();
        true
    }

    /// Flag the current route as crossing an obstruction.
    pub fn mark_stale(&self, session: &SessionId) -> bool {
        match self.inner.write().get_mut(session) {
            Some(occupant) => {
                occupant.route_stale = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, session: &SessionId) -> Option<Occupant> {
        self.inner.read().get(session).cloned()
    }

    pub fn contains(&self, session: &SessionId) -> bool {
        self.inner.read().contains_key(session)
    }

    /// Consistent copy of every occupant, in session order.
    pub fn all(&self) -> Vec<Occupant> {
        self.inner.read().values().cloned().collect()
    }

    /// Drop `session`, returning its final record marked DISCONNECTED.
    pub fn remove(&self, session: &SessionId) -> Option<Occupant> {
        let mut occupant = self.inner.write().remove(session)?;
        occupant.status      = OccupantStatus::Disconnected;
        occupant.last_update = now();
        debug!(session = %session, "occupant_removed");
        Some(occupant)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.inner.read().values().filter(|o| o.is_active()).count()
    }

    /// Routes per destination exit, taken under one read lock.
    pub fn exit_load(&self) -> ExitLoad {
        let map = self.inner.read();
        ExitLoad::from_routes(map.values().map(|o| o.route.as_slice()))
    }
}
