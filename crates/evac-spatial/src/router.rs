//! Routing trait and default A* implementation.
//!
//! # Pluggability
//!
//! The coordinator calls routing through the [`Router`] trait, so a
//! different search (precomputed exit trees, crowd-aware costs) can be
//! swapped in without touching the registries or the reroute protocol.
//!
//! # Cost model
//!
//! Both the cost-so-far `g` and the heuristic `h` are in metres: `g` sums
//! Euclidean corridor lengths and `h` is the straight-line distance to the
//! goal.  That pairing is admissible and consistent, so the first time the
//! goal is popped its path is optimal.
//!
//! # Determinism
//!
//! Frontier entries with equal `f` are popped in insertion order (a
//! monotonically increasing sequence number), and neighbours are expanded in
//! corridor insertion order.  Identical `(start, goal, excluded)` inputs
//! therefore always produce the identical path.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use evac_core::NodeId;

use crate::graph::WaypointGraph;
use crate::{SpatialError, SpatialResult};

/// Waypoints removed from consideration for one search (usually the
/// currently blocked set).
pub type Exclusion = FxHashSet<NodeId>;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the waypoint sequence from start to goal
/// and its geometric length.
///
/// An empty `nodes` vector means the goal was unreachable; callers report
/// that as `NO_ROUTE`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    /// Summed corridor length in metres.
    pub length_m: f32,
}

impl Route {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Waypoint count (not metres).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Final waypoint, if any.
    pub fn destination(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// `true` if start and goal were the same waypoint.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() == 1
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path search.
///
/// # Contract
///
/// - `start` and `goal` must be navigable waypoints, else
///   [`SpatialError::InvalidNode`].
/// - `start == goal` yields the single-element route.
/// - Waypoints in `excluded` are never entered.  The start itself is exempt
///   so an occupant standing on a blocked waypoint can still leave it.
/// - Unreachable goals yield `Ok(Route::empty())`, not an error.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; reroutes for different occupants
/// run concurrently against the same router and graph.
pub trait Router: Send + Sync {
    fn find_route(
        &self,
        graph:    &WaypointGraph,
        start:    NodeId,
        goal:     NodeId,
        excluded: &Exclusion,
    ) -> SpatialResult<Route>;
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// A* over the corridor graph with geometric edge weights and a
/// straight-line heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarRouter;

impl Router for AStarRouter {
    fn find_route(
        &self,
        graph:    &WaypointGraph,
        start:    NodeId,
        goal:     NodeId,
        excluded: &Exclusion,
    ) -> SpatialResult<Route> {
        astar(graph, start, goal, excluded)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Open-set entry.  Ordered so that `BinaryHeap` (a max-heap) pops the
/// lowest `f` first and, among equal `f`, the earliest inserted.
#[derive(Clone, Copy)]
struct Frontier {
    f:    f32,
    seq:  u64,
    node: NodeId,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

fn check_navigable(graph: &WaypointGraph, node: NodeId) -> SpatialResult<()> {
    if graph.is_navigable(node) {
        Ok(())
    } else {
        Err(SpatialError::InvalidNode(node))
    }
}

fn astar(
    graph:    &WaypointGraph,
    start:    NodeId,
    goal:     NodeId,
    excluded: &Exclusion,
) -> SpatialResult<Route> {
    check_navigable(graph, start)?;
    check_navigable(graph, goal)?;

    if start == goal {
        return Ok(Route { nodes: vec![start], length_m: 0.0 });
    }

    let n      = graph.node_count();
    let target = graph.pos(goal);
    let h      = |node: NodeId| graph.node_pos[node.index()].distance(target);

    // g[v] = best known path length (m) to v.
    let mut g      = vec![f32::INFINITY; n];
    // parent[v] = predecessor on that path; INVALID for unreached nodes.
    let mut parent = vec![NodeId::INVALID; n];
    let mut closed = vec![false; n];

    let mut open = BinaryHeap::new();
    let mut seq  = 0u64;
    g[start.index()] = 0.0;
    open.push(Frontier { f: h(start), seq, node: start });

    while let Some(Frontier { node, .. }) = open.pop() {
        if closed[node.index()] {
            continue; // stale duplicate
        }
        if node == goal {
            return Ok(reconstruct(&parent, start, goal, g[goal.index()]));
        }
        closed[node.index()] = true;

        for edge in graph.out_edges(node) {
            let next = graph.edge_to[edge.index()];
            if closed[next.index()] || excluded.contains(&next) {
                continue;
            }
            let tentative = g[node.index()] + graph.edge_length(edge);
            if tentative < g[next.index()] {
                g[next.index()]      = tentative;
                parent[next.index()] = node;
                seq += 1;
                open.push(Frontier { f: tentative + h(next), seq, node: next });
            }
        }
    }

    Ok(Route::empty())
}

fn reconstruct(parent: &[NodeId], start: NodeId, goal: NodeId, length_m: f32) -> Route {
    let mut nodes = vec![goal];
    let mut cur = goal;
    while cur != start {
        cur = parent[cur.index()];
        debug_assert!(cur.is_valid(), "broken parent chain");
        nodes.push(cur);
    }
    nodes.reverse();
    Route { nodes, length_m }
}
