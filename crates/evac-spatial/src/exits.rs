//! Exit selection: path cost plus live congestion.
//!
//! ```text
//! score(exit) = hops(from → exit) + congestion_weight × load(exit)
//! ```
//!
//! `hops` is the waypoint count of the unobstructed route and `load` is the
//! number of occupants whose assigned route currently *ends* at that exit.
//! An occupant who has already walked through an exit keeps counting toward
//! its load until they are reassigned or disconnect.

use rustc_hash::FxHashMap;

use evac_core::NodeId;

use crate::graph::WaypointGraph;
use crate::router::{Exclusion, Router};
use crate::SpatialResult;

// ── ExitLoad ──────────────────────────────────────────────────────────────────

/// Per-exit count of assigned routes, built from an occupant snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitLoad {
    counts: FxHashMap<NodeId, u32>,
}

impl ExitLoad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count each route by its final waypoint.  Empty routes are skipped.
    pub fn from_routes<'a, I>(routes: I) -> Self
    where
        I: IntoIterator<Item = &'a [NodeId]>,
    {
        let mut load = Self::new();
        for route in routes {
            if let Some(&last) = route.last() {
                load.record(last);
            }
        }
        load
    }

    pub fn record(&mut self, exit: NodeId) {
        *self.counts.entry(exit).or_insert(0) += 1;
    }

    pub fn get(&self, exit: NodeId) -> u32 {
        self.counts.get(&exit).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

// ── ExitScore ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitScore {
    pub exit:  NodeId,
    /// Waypoint count of the unobstructed route to `exit`.
    pub hops:  u32,
    pub load:  u32,
    pub score: u32,
}

// ── ExitSelector ──────────────────────────────────────────────────────────────

/// Chooses a destination exit for an occupant.
#[derive(Debug, Clone, Copy)]
pub struct ExitSelector {
    pub congestion_weight: u32,
}

impl Default for ExitSelector {
    fn default() -> Self {
        Self { congestion_weight: Self::DEFAULT_CONGESTION_WEIGHT }
    }
}

impl ExitSelector {
    pub const DEFAULT_CONGESTION_WEIGHT: u32 = 10;

    pub fn new(congestion_weight: u32) -> Self {
        Self { congestion_weight }
    }

    /// Every exit reachable from `from` (ignoring obstructions), ascending by
    /// score.  Equal scores keep the graph's fixed exit order.
    pub fn ranked_exits<R: Router + ?Sized>(
        &self,
        router: &R,
        graph:  &WaypointGraph,
        from:   NodeId,
        load:   &ExitLoad,
    ) -> SpatialResult<Vec<ExitScore>> {
        rank(router, graph, from, load, self.congestion_weight)
    }

    /// Lowest-scoring reachable exit, or `None` if no exit is reachable.
    pub fn best_exit<R: Router + ?Sized>(
        &self,
        router: &R,
        graph:  &WaypointGraph,
        from:   NodeId,
        load:   &ExitLoad,
    ) -> SpatialResult<Option<NodeId>> {
        Ok(self.ranked_exits(router, graph, from, load)?.first().map(|s| s.exit))
    }

    /// Closest reachable exit by waypoint count, without the congestion term.
    pub fn nearest_exit<R: Router + ?Sized>(
        &self,
        router: &R,
        graph:  &WaypointGraph,
        from:   NodeId,
    ) -> SpatialResult<Option<NodeId>> {
        let ranked = rank(router, graph, from, &ExitLoad::new(), 0)?;
        Ok(ranked.first().map(|s| s.exit))
    }
}

fn rank<R: Router + ?Sized>(
    router: &R,
    graph:  &WaypointGraph,
    from:   NodeId,
    load:   &ExitLoad,
    weight: u32,
) -> SpatialResult<Vec<ExitScore>> {
    let unobstructed = Exclusion::default();
    let mut scores = Vec::with_capacity(graph.exits().len());

    for &exit in graph.exits() {
        let route = router.find_route(graph, from, exit, &unobstructed)?;
        if route.is_empty() {
            continue;
        }
        let hops  = route.len() as u32;
        let count = load.get(exit);
        scores.push(ExitScore {
            exit,
            hops,
            load:  count,
            score: hops.saturating_add(weight.saturating_mul(count)),
        });
    }

    // Stable: ties stay in exit-table order.
    scores.sort_by_key(|s| s.score);
    Ok(scores)
}
