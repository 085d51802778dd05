//! CSV map loader.
//!
//! # CSV format
//!
//! Two files describe one floor.  The waypoint table lists every waypoint,
//! rooms included:
//!
//! ```csv
//! id,x,y,label,kind,navigable
//! p129,335.76,200.32,h4,JUNCTION,true
//! p200,287.76,724.44,Exit 1,EXIT,true
//! p69,526.4,319.8,1063,ROOM,false
//! ```
//!
//! The corridor list pairs navigable waypoint ids; each row is one
//! bidirectional corridor:
//!
//! ```csv
//! a,b
//! p129,p100
//! ```
//!
//! Exit order (used to break exit-score ties) is the order of `EXIT` rows.
//! An empty `label` falls back to the id.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use evac_core::{Point, WaypointKind};

use crate::graph::{WaypointGraph, WaypointGraphBuilder, WaypointSpec};
use crate::{SpatialError, SpatialResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WaypointRecord {
    id:        String,
    x:         f32,
    y:         f32,
    #[serde(default)]
    label:     String,
    kind:      WaypointKind,
    navigable: bool,
}

#[derive(Deserialize)]
struct CorridorRecord {
    a: String,
    b: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`WaypointGraph`] from a waypoint CSV and a corridor CSV.
pub fn load_graph_csv(waypoints: &Path, corridors: &Path) -> SpatialResult<WaypointGraph> {
    let w = std::fs::File::open(waypoints)?;
    let c = std::fs::File::open(corridors)?;
    load_graph_reader(w, c)
}

/// Like [`load_graph_csv`] but accepts any `Read` sources.
pub fn load_graph_reader<W: Read, C: Read>(waypoints: W, corridors: C) -> SpatialResult<WaypointGraph> {
    let mut builder = WaypointGraphBuilder::new();

    let mut rows = csv::Reader::from_reader(waypoints);
    for result in rows.deserialize::<WaypointRecord>() {
        let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
        let label = if row.label.trim().is_empty() { row.id.clone() } else { row.label };
        builder.add_waypoint(WaypointSpec {
            key:       row.id,
            pos:       Point::new(row.x, row.y),
            label,
            kind:      row.kind,
            navigable: row.navigable,
        })?;
    }

    let mut rows = csv::Reader::from_reader(corridors);
    for result in rows.deserialize::<CorridorRecord>() {
        let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
        builder.connect(row.a.trim(), row.b.trim())?;
    }

    let graph = builder.build();
    info!(
        waypoints = graph.node_count(),
        corridors = graph.corridor_count(),
        exits = graph.exits().len(),
        "graph_loaded"
    );
    Ok(graph)
}
