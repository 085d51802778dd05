//! Blockage-driven rerouting, and the plan/commit cycle every route
//! assignment goes through.
//!
//! # Plan, then commit
//!
//! Routing runs without any engine-wide lock, against a snapshot of the
//! blocked set.  Storing the result takes `assign_lock` and first checks the
//! obstruction generation: if any blockage was added or cleared since the
//! snapshot the plan is thrown away and recomputed.  A route planned against
//! an older blocked set is therefore never stored.
//!
//! # Blockage protocol
//!
//! When a waypoint becomes blocked:
//!
//! 1. **Snapshot** the occupant registry and the blocked set together, under
//!    `assign_lock`.  `affected` is every occupant whose assigned route
//!    contains the waypoint.
//! 2. **Alert** each affected session (`blockage_alert`, with its distance
//!    to the blockage).
//! 3. **Plan** a new route for each affected occupant from its current
//!    waypoint, scoring exits against the load of the *same* snapshot and
//!    routing around the full blocked set.  With the `parallel` feature (on
//!    by default) this step runs on Rayon; plans read only immutable data.
//! 4. **Apply** results sequentially in session order.  A successful plan
//!    replaces the route and sends `route_assigned`.  A failed plan keeps the
//!    old route, marks it stale, and sends `error(NO_ROUTE)` to that session
//!    only.  Updates for sessions that disconnected since the snapshot are
//!    dropped by the registry.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use evac_core::{EvacResult, NodeId, SessionId, now};
use evac_registry::{
    Obstruction, ObstructionRegistry, Occupant, OccupantRegistry, StateMirror, occupant_key, put_json,
};
use evac_spatial::{DirectionSynthesizer, Exclusion, ExitLoad, Router};

use crate::event::Outbound;
use crate::notifier::Notifier;
use crate::planner::{Plan, RoutePlanner};
use crate::views::OccupantRecord;

/// Outcome of one reroute pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RerouteSummary {
    pub affected: usize,
    pub rerouted: usize,
}

/// Borrows everything a route assignment touches.  Built per call by the
/// service.
pub struct RerouteCoordinator<'a, R: Router + ?Sized> {
    pub planner:      RoutePlanner<'a, R>,
    pub occupants:    &'a OccupantRegistry,
    pub obstructions: &'a ObstructionRegistry,
    /// Serializes commits.  Never held while routing.
    pub assign_lock:  &'a Mutex<()>,
    pub notifier:     &'a dyn Notifier,
    pub mirror:       &'a dyn StateMirror,
    /// `None` disables directions on `route_assigned`.
    pub directions:   Option<DirectionSynthesizer>,
}

impl<R: Router + ?Sized> RerouteCoordinator<'_, R> {
    /// Run `plan` against `snapshot` (a generation and its blocked set),
    /// then `commit` the result under `assign_lock`.  If the obstruction
    /// generation moved in between, take a fresh snapshot and plan again.
    pub fn plan_and_commit<T, U>(
        &self,
        mut snapshot: (u64, Exclusion),
        plan:         impl Fn(&Exclusion) -> T,
        commit:       impl FnOnce(T, &Exclusion) -> U,
    ) -> U {
        loop {
            let planned = plan(&snapshot.1);
            let guard = self.assign_lock.lock();
            if self.obstructions.generation() == snapshot.0 {
                return commit(planned, &snapshot.1);
            }
            drop(guard);
            debug!(generation = snapshot.0, "obstructions_changed_replanning");
            snapshot = self.obstructions.snapshot();
        }
    }

    /// Reroute every occupant whose route crosses `obstruction.waypoint`.
    /// Call after the obstruction is stored.
    pub fn obstruction_added(&self, obstruction: &Obstruction) -> RerouteSummary {
        let graph    = self.planner.graph();
        let waypoint = obstruction.waypoint;
        let location = graph.key(waypoint);

        // ── 1. Snapshot ───────────────────────────────────────────────────
        let (obstructed, snapshot) = {
            let _guard = self.assign_lock.lock();
            (self.obstructions.snapshot(), self.occupants.all())
        };
        let load = ExitLoad::from_routes(snapshot.iter().map(|o| o.route.as_slice()));
        let affected: Vec<&Occupant> = snapshot.iter().filter(|o| o.route_contains(waypoint)).collect();

        info!(location, affected = affected.len(), "reroute_started");

        // ── 2. Alerts ─────────────────────────────────────────────────────
        for occupant in &affected {
            let alert = Outbound::BlockageAlert {
                location:   location.to_string(),
                distance_m: graph.distance(occupant.current, waypoint) as u32,
                severity:   obstruction.severity,
                category:   obstruction.category,
                message:    obstruction.message.clone(),
                timestamp:  now(),
            };
            self.notifier.send(&occupant.session, &alert);
        }

        // ── 3. Plan, 4. Apply ─────────────────────────────────────────────
        let reason = format!("Rerouted due to blockage at {location}");
        let rerouted = self.plan_and_commit(
            obstructed,
            |blocked| self.plan_all(&affected, &load, blocked),
            |plans, _| {
                let mut rerouted = 0;
                for (occupant, plan) in affected.iter().zip(plans) {
                    match plan {
                        Ok(plan) => {
                            if self.assign(&occupant.session, plan.route.nodes, &reason) {
                                rerouted += 1;
                            }
                        }
                        Err(e) => {
                            warn!(session = %occupant.session, location, error = %e, "reroute_failed");
                            if self.occupants.mark_stale(&occupant.session) {
                                self.notifier.send(&occupant.session, &Outbound::error(&e));
                            }
                        }
                    }
                }
                rerouted
            },
        );

        info!(location, affected = affected.len(), rerouted, "reroute_finished");
        RerouteSummary { affected: affected.len(), rerouted }
    }

    fn plan_all(&self, affected: &[&Occupant], load: &ExitLoad, blocked: &Exclusion) -> Vec<EvacResult<Plan>> {
        #[cfg(not(feature = "parallel"))]
        let plans: Vec<_> = affected
            .iter()
            .map(|o| self.planner.plan(o.current, load, blocked))
            .collect();

        #[cfg(feature = "parallel")]
        let plans: Vec<_> = {
            use rayon::prelude::*;
            affected
                .par_iter()
                .map(|o| self.planner.plan(o.current, load, blocked))
                .collect()
        };

        plans
    }

    /// Store `route` for `session` and tell it.  `false` if the session is
    /// gone.
    pub fn assign(&self, session: &SessionId, route: Vec<NodeId>, reason: &str) -> bool {
        let graph = self.planner.graph();
        let directions = match self.directions {
            Some(synth) => synth.synthesize(graph, &route),
            None        => Vec::new(),
        };
        let keys = graph.keys(&route);
        let destination = keys.last().cloned();

        if !self.occupants.update_route(session, route) {
            debug!(session = %session, "route_assignment_dropped");
            return false;
        }
        if let Some(occupant) = self.occupants.get(session) {
            put_json(self.mirror, &occupant_key(session), &OccupantRecord::new(graph, &occupant));
        }

        debug!(session = %session, destination = ?destination, hops = keys.len(), reason, "route_assigned");
        self.notifier.send(
            session,
            &Outbound::RouteAssigned {
                session_id:  session.clone(),
                route:       keys,
                destination,
                reason:      reason.to_string(),
                directions,
                timestamp:   now(),
            },
        );
        true
    }
}
