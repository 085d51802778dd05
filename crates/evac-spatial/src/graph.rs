//! Waypoint graph representation and builder.
//!
//! # Data layout
//!
//! Waypoints live in parallel `Vec`s indexed by `NodeId`.  Corridors use
//! **Compressed Sparse Row (CSR)** adjacency: every undirected corridor is
//! stored as two directed edges, and the outgoing edges of node `n` occupy
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Edges keep corridor insertion order within each source node, so neighbour
//! iteration (and therefore A* tie-breaking) is reproducible.
//!
//! Edge weight is the Euclidean distance between the endpoints.  It is
//! derived from `node_pos` on demand and never stored.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over the navigable waypoints maps a plan position
//! to the nearest waypoint an occupant can actually stand on.  Rooms are
//! resolved through it when a report names a room instead of a hallway.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use evac_core::{EdgeId, NodeId, Point, WaypointKind};

use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2], // [x, y]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── WaypointSpec ──────────────────────────────────────────────────────────────

/// One row of the static waypoint table, as handed to the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSpec {
    pub key:       String,
    pub pos:       Point,
    pub label:     String,
    pub kind:      WaypointKind,
    pub navigable: bool,
}

impl WaypointSpec {
    pub fn junction(key: &str, x: f32, y: f32) -> Self {
        Self::navigable(key, x, y, WaypointKind::Junction)
    }

    pub fn exit(key: &str, x: f32, y: f32) -> Self {
        Self::navigable(key, x, y, WaypointKind::Exit)
    }

    pub fn room(key: &str, x: f32, y: f32, label: &str) -> Self {
        Self {
            key:       key.to_string(),
            pos:       Point::new(x, y),
            label:     label.to_string(),
            kind:      WaypointKind::Room,
            navigable: false,
        }
    }

    /// Replace the display label (defaults to the key).
    pub fn labelled(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    fn navigable(key: &str, x: f32, y: f32, kind: WaypointKind) -> Self {
        Self {
            key:       key.to_string(),
            pos:       Point::new(x, y),
            label:     key.to_string(),
            kind,
            navigable: true,
        }
    }
}

// ── WaypointGraph ─────────────────────────────────────────────────────────────

/// Immutable navigable waypoint network plus the informational room table.
///
/// All SoA fields are `pub` for direct indexed access in the router's inner
/// loop.  Do not construct directly; use [`WaypointGraphBuilder`] or the CSV
/// loader.
pub struct WaypointGraph {
    // ── Waypoint table ────────────────────────────────────────────────────
    /// External key (`"p129"`).  Indexed by `NodeId`.
    pub node_key: Vec<String>,

    /// Projected plan position in metres.
    pub node_pos: Vec<Point>,

    /// Human-readable label used in instructions (`"h4"`, `"Exit 1"`).
    pub node_label: Vec<String>,

    pub node_kind: Vec<WaypointKind>,

    /// `false` for rooms; only navigable waypoints have corridors.
    pub node_navigable: Vec<bool>,

    // ── CSR corridor adjacency ────────────────────────────────────────────
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Source of each directed edge.  Indexed by `EdgeId`.
    pub edge_from: Vec<NodeId>,

    /// Destination of each directed edge.
    pub edge_to: Vec<NodeId>,

    // ── Lookups ───────────────────────────────────────────────────────────
    /// Navigable exits in table order.  This order breaks exit-score ties.
    exits: Vec<NodeId>,

    key_index: FxHashMap<String, NodeId>,

    spatial_idx: RTree<NodeEntry>,
}

impl std::fmt::Debug for WaypointGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaypointGraph")
            .field("waypoints", &self.node_count())
            .field("corridors", &self.corridor_count())
            .field("exits", &self.exits.len())
            .finish_non_exhaustive()
    }
}

impl WaypointGraph {
    /// A graph with no waypoints.  Every routing request against it fails
    /// with an invalid-node error.
    pub fn empty() -> Self {
        WaypointGraphBuilder::new().build()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    /// Number of directed edges (twice the corridor count).
    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn corridor_count(&self) -> usize {
        self.edge_to.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// `EdgeId`s of all outgoing edges from `node`, in corridor insertion order.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Waypoints directly connected to `node`.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(node).map(|e| self.edge_to[e.index()])
    }

    /// Geometric weight of `edge` in metres.
    #[inline]
    pub fn edge_length(&self, edge: EdgeId) -> f32 {
        let from = self.node_pos[self.edge_from[edge.index()].index()];
        let to   = self.node_pos[self.edge_to[edge.index()].index()];
        from.distance(to)
    }

    /// Straight-line distance between two waypoints in metres.
    #[inline]
    pub fn distance(&self, a: NodeId, b: NodeId) -> f32 {
        self.node_pos[a.index()].distance(self.node_pos[b.index()])
    }

    /// Summed geometric length of a waypoint sequence.
    pub fn path_length(&self, path: &[NodeId]) -> f32 {
        path.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// `true` if `a` and `b` share a corridor.
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.contains(a) && self.neighbors(a).any(|n| n == b)
    }

    // ── Waypoint attributes ───────────────────────────────────────────────

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    #[inline]
    pub fn is_navigable(&self, node: NodeId) -> bool {
        self.contains(node) && self.node_navigable[node.index()]
    }

    pub fn key(&self, node: NodeId) -> &str {
        &self.node_key[node.index()]
    }

    pub fn label(&self, node: NodeId) -> &str {
        &self.node_label[node.index()]
    }

    pub fn pos(&self, node: NodeId) -> Point {
        self.node_pos[node.index()]
    }

    pub fn kind(&self, node: NodeId) -> WaypointKind {
        self.node_kind[node.index()]
    }

    /// Keys for a sequence of nodes, e.g. to put a route on the wire.
    pub fn keys(&self, nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().map(|&n| self.node_key[n.index()].clone()).collect()
    }

    // ── Exits ─────────────────────────────────────────────────────────────

    /// Navigable exits in fixed table order.
    pub fn exits(&self) -> &[NodeId] {
        &self.exits
    }

    pub fn is_exit(&self, node: NodeId) -> bool {
        self.exits.contains(&node)
    }

    // ── Key lookups ───────────────────────────────────────────────────────

    /// `NodeId` for `key`, navigable or not.
    pub fn node(&self, key: &str) -> Option<NodeId> {
        self.key_index.get(key).copied()
    }

    /// `NodeId` for `key`, failing unless it names a navigable waypoint.
    pub fn navigable_node(&self, key: &str) -> SpatialResult<NodeId> {
        match self.node(key) {
            None => Err(SpatialError::UnknownWaypoint(key.to_string())),
            Some(n) if !self.node_navigable[n.index()] => {
                Err(SpatialError::NotNavigable(key.to_string()))
            }
            Some(n) => Ok(n),
        }
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest navigable waypoint to `pos`.  `None` only when the graph has
    /// no navigable waypoints.
    pub fn snap(&self, pos: Point) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.x, pos.y])
            .map(|e| e.id)
    }

    /// Resolve a free-text location mention to a blockable waypoint.
    ///
    /// Tries, in order: exact key, case-insensitive label (navigable
    /// waypoints first), and `p`-prefixed key.  A mention that lands on a
    /// room is snapped to the nearest navigable waypoint.
    pub fn resolve_mention(&self, mention: &str) -> Option<NodeId> {
        let mention = mention.trim();
        if mention.is_empty() {
            return None;
        }

        let hit = self
            .node(mention)
            .or_else(|| self.find_label(mention))
            .or_else(|| self.node(&format!("p{mention}")))?;

        if self.node_navigable[hit.index()] {
            Some(hit)
        } else {
            self.snap(self.node_pos[hit.index()])
        }
    }

    fn find_label(&self, label: &str) -> Option<NodeId> {
        let same_label = |i: &usize| self.node_label[*i].eq_ignore_ascii_case(label);
        let mut candidates = (0..self.node_count()).filter(same_label);
        let first = candidates.next()?;
        if self.node_navigable[first] {
            return Some(NodeId(first as u32));
        }
        let navigable = candidates.find(|&i| self.node_navigable[i]).unwrap_or(first);
        Some(NodeId(navigable as u32))
    }
}

// ── WaypointGraphBuilder ──────────────────────────────────────────────────────

/// Construct a [`WaypointGraph`] incrementally, then call [`build`](Self::build).
///
/// Waypoints and corridors are validated as they are added, so `build()`
/// itself cannot fail.
///
/// # Example
///
/// ```
/// use evac_spatial::{WaypointGraphBuilder, WaypointSpec};
///
/// let mut b = WaypointGraphBuilder::new();
/// b.add_waypoint(WaypointSpec::junction("p1", 0.0, 0.0)).unwrap();
/// b.add_waypoint(WaypointSpec::exit("p2", 30.0, 40.0)).unwrap();
/// b.connect("p1", "p2").unwrap();
/// let graph = b.build();
/// assert_eq!(graph.corridor_count(), 1);
/// assert_eq!(graph.exits().len(), 1);
/// ```
pub struct WaypointGraphBuilder {
    nodes:     Vec<WaypointSpec>,
    key_index: FxHashMap<String, NodeId>,
    corridors: Vec<(NodeId, NodeId)>,
}

impl WaypointGraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes:     Vec::new(),
            key_index: FxHashMap::default(),
            corridors: Vec::new(),
        }
    }

    pub fn with_capacity(nodes: usize, corridors: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            key_index: FxHashMap::default(),
            corridors: Vec::with_capacity(corridors),
        }
    }

    /// Add a waypoint and return its `NodeId` (sequential from 0).
    pub fn add_waypoint(&mut self, spec: WaypointSpec) -> SpatialResult<NodeId> {
        if self.key_index.contains_key(&spec.key) {
            return Err(SpatialError::DuplicateWaypoint(spec.key));
        }
        if spec.navigable && spec.kind == WaypointKind::Room {
            return Err(SpatialError::NavigableRoom(spec.key));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.key_index.insert(spec.key.clone(), id);
        self.nodes.push(spec);
        Ok(id)
    }

    /// Add an undirected corridor between two navigable waypoints.
    pub fn add_corridor(&mut self, a: NodeId, b: NodeId) -> SpatialResult<()> {
        for n in [a, b] {
            match self.nodes.get(n.index()) {
                None => return Err(SpatialError::InvalidNode(n)),
                Some(spec) if !spec.navigable => {
                    return Err(SpatialError::NotNavigable(spec.key.clone()));
                }
                Some(_) => {}
            }
        }
        if a == b {
            return Err(SpatialError::SelfLoop(self.nodes[a.index()].key.clone()));
        }
        self.corridors.push((a, b));
        Ok(())
    }

    /// Convenience: [`add_corridor`](Self::add_corridor) by waypoint key.
    pub fn connect(&mut self, a: &str, b: &str) -> SpatialResult<()> {
        let a = self.node(a).ok_or_else(|| SpatialError::UnknownWaypoint(a.to_string()))?;
        let b = self.node(b).ok_or_else(|| SpatialError::UnknownWaypoint(b.to_string()))?;
        self.add_corridor(a, b)
    }

    pub fn node(&self, key: &str) -> Option<NodeId> {
        self.key_index.get(key).copied()
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn corridor_count(&self) -> usize { self.corridors.len() }

    /// Consume the builder and produce a [`WaypointGraph`].
    pub fn build(self) -> WaypointGraph {
        let node_count = self.nodes.len();

        // Both directions of every corridor, then a *stable* sort by source
        // so each node's neighbours keep insertion order.
        let mut raw: Vec<(NodeId, NodeId)> = Vec::with_capacity(self.corridors.len() * 2);
        for &(a, b) in &self.corridors {
            raw.push((a, b));
            raw.push((b, a));
        }
        raw.sort_by_key(|&(from, _)| from.0);

        let edge_from: Vec<NodeId> = raw.iter().map(|&(f, _)| f).collect();
        let edge_to:   Vec<NodeId> = raw.iter().map(|&(_, t)| t).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for &(from, _) in &raw {
            node_out_start[from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.navigable)
            .map(|(i, spec)| NodeEntry {
                point: [spec.pos.x, spec.pos.y],
                id:    NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        let exits = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.navigable && spec.kind.is_exit())
            .map(|(i, _)| NodeId(i as u32))
            .collect();

        let mut node_key       = Vec::with_capacity(node_count);
        let mut node_pos       = Vec::with_capacity(node_count);
        let mut node_label     = Vec::with_capacity(node_count);
        let mut node_kind      = Vec::with_capacity(node_count);
        let mut node_navigable = Vec::with_capacity(node_count);
        for spec in self.nodes {
            node_key.push(spec.key);
            node_pos.push(spec.pos);
            node_label.push(spec.label);
            node_kind.push(spec.kind);
            node_navigable.push(spec.navigable);
        }

        WaypointGraph {
            node_key,
            node_pos,
            node_label,
            node_kind,
            node_navigable,
            node_out_start,
            edge_from,
            edge_to,
            exits,
            key_index: self.key_index,
            spatial_idx,
        }
    }
}

impl Default for WaypointGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
