//! Serializable read models: query answers and mirrored records.
//!
//! Everything here speaks waypoint keys, never `NodeId`s.

use std::collections::BTreeMap;

use serde::Serialize;

use evac_core::{Category, OccupantStatus, SessionId, Severity, Timestamp};
use evac_registry::{Obstruction, Occupant};
use evac_spatial::{ExitScore, Route, WaypointGraph};

// ── Query answers ─────────────────────────────────────────────────────────────

/// Answer to a route test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProbe {
    pub route:    Vec<String>,
    /// Geometric length in metres.
    pub length_m: f32,
    pub found:    bool,
}

impl RouteProbe {
    pub fn new(graph: &WaypointGraph, route: &Route) -> Self {
        Self {
            route:    graph.keys(&route.nodes),
            length_m: route.length_m,
            found:    !route.is_empty(),
        }
    }
}

/// One row of an exit ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRanking {
    pub exit:  String,
    pub label: String,
    pub hops:  u32,
    pub load:  u32,
    pub score: u32,
}

impl ExitRanking {
    pub fn new(graph: &WaypointGraph, score: &ExitScore) -> Self {
        Self {
            exit:  graph.key(score.exit).to_string(),
            label: graph.label(score.exit).to_string(),
            hops:  score.hops,
            load:  score.load,
            score: score.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantSummary {
    pub session_id:  SessionId,
    pub name:        String,
    pub position:    String,
    pub status:      OccupantStatus,
    pub progress:    usize,
    pub route_len:   usize,
    pub destination: Option<String>,
    pub route_stale: bool,
}

/// Aggregate engine statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub connected_count: usize,
    pub active_count:    usize,
    pub blockage_count:  usize,
    /// Routes per exit key; every exit is listed, idle ones with 0.
    pub per_exit_load:   BTreeMap<String, u32>,
    pub blocked:         Vec<String>,
    pub occupants:       Vec<OccupantSummary>,
}

impl Stats {
    pub fn collect(graph: &WaypointGraph, occupants: &[Occupant], obstructions: &[Obstruction]) -> Self {
        let mut per_exit_load: BTreeMap<String, u32> =
            graph.exits().iter().map(|&e| (graph.key(e).to_string(), 0)).collect();
        for occupant in occupants {
            if let Some(exit) = occupant.destination() {
                *per_exit_load.entry(graph.key(exit).to_string()).or_insert(0) += 1;
            }
        }

        Self {
            connected_count: occupants.len(),
            active_count:    occupants.iter().filter(|o| o.is_active()).count(),
            blockage_count:  obstructions.len(),
            per_exit_load,
            blocked:         obstructions.iter().map(|o| graph.key(o.waypoint).to_string()).collect(),
            occupants:       occupants
                .iter()
                .map(|o| OccupantSummary {
                    session_id:  o.session.clone(),
                    name:        o.name.clone(),
                    position:    graph.key(o.current).to_string(),
                    status:      o.status,
                    progress:    o.progress,
                    route_len:   o.route.len(),
                    destination: o.destination().map(|e| graph.key(e).to_string()),
                    route_stale: o.route_stale,
                })
                .collect(),
        }
    }
}

// ── Mirror records ────────────────────────────────────────────────────────────

/// Mirrored under `occupant:<session>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantRecord {
    pub name:             String,
    pub current_waypoint: String,
    pub route:            Vec<String>,
    pub status:           OccupantStatus,
    pub progress:         usize,
    pub route_stale:      bool,
    pub joined_at:        Timestamp,
    pub last_update:      Timestamp,
}

impl OccupantRecord {
    pub fn new(graph: &WaypointGraph, o: &Occupant) -> Self {
        Self {
            name:             o.name.clone(),
            current_waypoint: graph.key(o.current).to_string(),
            route:            graph.keys(&o.route),
            status:           o.status,
            progress:         o.progress,
            route_stale:      o.route_stale,
            joined_at:        o.joined_at,
            last_update:      o.last_update,
        }
    }
}

/// Mirrored under `obstruction:<waypoint>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstructionRecord {
    pub location:      String,
    pub severity:      Severity,
    #[serde(rename = "type")]
    pub category:      Category,
    pub reported_by:   Option<SessionId>,
    pub reporter_name: Option<String>,
    pub message:       String,
    pub timestamp:     Timestamp,
}

impl ObstructionRecord {
    pub fn new(graph: &WaypointGraph, o: &Obstruction) -> Self {
        Self {
            location:      graph.key(o.waypoint).to_string(),
            severity:      o.severity,
            category:      o.category,
            reported_by:   o.reporter.clone(),
            reporter_name: o.reporter_name.clone(),
            message:       o.message.clone(),
            timestamp:     o.reported_at,
        }
    }
}
