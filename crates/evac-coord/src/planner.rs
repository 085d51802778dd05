//! Destination choice plus obstructed routing for one occupant.

use tracing::debug;

use evac_core::{EvacError, EvacResult, NodeId};
use evac_spatial::{
    Exclusion, ExitLoad, ExitSelector, Route, Router, SpatialError, WaypointGraph,
};

/// A routed assignment: where to go and how.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub exit:  NodeId,
    pub route: Route,
}

/// Combines the exit selector and the router.
///
/// Candidate exits are tried in this order, each routed around `blocked`:
///
/// 1. the congestion-ranked best exit,
/// 2. the nearest exit (no congestion term),
/// 3. the remaining ranked exits, best first.
///
/// The ranking itself ignores obstructions (it scores the *unobstructed*
/// path), so an exit can rank first and still be unroutable; that is what
/// the fallbacks are for.
pub struct RoutePlanner<'a, R: Router + ?Sized> {
    graph:    &'a WaypointGraph,
    router:   &'a R,
    selector: ExitSelector,
}

impl<'a, R: Router + ?Sized> RoutePlanner<'a, R> {
    pub fn new(graph: &'a WaypointGraph, router: &'a R, selector: ExitSelector) -> Self {
        Self { graph, router, selector }
    }

    pub fn graph(&self) -> &'a WaypointGraph {
        self.graph
    }

    /// Plan an evacuation route from `from`.  Fails with `NO_ROUTE` when no
    /// exit can be reached around `blocked`.
    pub fn plan(&self, from: NodeId, load: &ExitLoad, blocked: &Exclusion) -> EvacResult<Plan> {
        let graph = self.graph;
        let spatial = |e: SpatialError| EvacError::InvalidNode(e.to_string());

        let ranked  = self.selector.ranked_exits(self.router, graph, from, load).map_err(spatial)?;
        let nearest = self.selector.nearest_exit(self.router, graph, from).map_err(spatial)?;

        let best = ranked.first().map(|s| s.exit);
        let rest = ranked.iter().map(|s| s.exit);
        let mut candidates: Vec<NodeId> = Vec::with_capacity(ranked.len() + 1);
        for exit in best.into_iter().chain(nearest).chain(rest) {
            if !candidates.contains(&exit) {
                candidates.push(exit);
            }
        }

        for exit in candidates {
            let route = self.router.find_route(graph, from, exit, blocked).map_err(spatial)?;
            if !route.is_empty() {
                debug!(from = graph.key(from), exit = graph.key(exit), hops = route.len(), "route_planned");
                return Ok(Plan { exit, route });
            }
        }

        Err(EvacError::NoRoute(graph.key(from).to_string()))
    }

    /// Route from `from` to a specific `goal` around `blocked`.
    pub fn route_to(&self, from: NodeId, goal: NodeId, blocked: &Exclusion) -> EvacResult<Route> {
        self.router
            .find_route(self.graph, from, goal, blocked)
            .map_err(|e| EvacError::InvalidNode(e.to_string()))
    }
}
