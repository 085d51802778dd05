//! Unit tests for evac-spatial.
//!
//! Most tests use a hand-built slice of floor 1 with the real plan
//! coordinates; one module loads the full `data/floor1` map.

#[cfg(test)]
mod helpers {
    use evac_core::NodeId;
    use crate::{WaypointGraph, WaypointGraphBuilder, WaypointSpec};

    /// The west corridor loop of floor 1.
    ///
    /// ```text
    ///   p135(h10) ── p129(h4)
    ///     │            │
    ///   p101(h20)    p100(h19)
    ///     │            │
    ///   p130(h5) ── p134(h9) ── p133(h8)
    ///                  │
    ///                p200(Exit 1)
    /// ```
    ///
    /// `with_loop = false` leaves only the east spine
    /// `p129–p100–p133–p134–p200`.
    pub fn west_wing(with_loop: bool) -> WaypointGraph {
        let mut b = WaypointGraphBuilder::new();
        b.add_waypoint(WaypointSpec::junction("p129", 335.76, 200.32).labelled("h4")).unwrap();
        b.add_waypoint(WaypointSpec::junction("p100", 331.0, 421.0).labelled("h19")).unwrap();
        b.add_waypoint(WaypointSpec::junction("p133", 337.68, 678.32).labelled("h8")).unwrap();
        b.add_waypoint(WaypointSpec::junction("p134", 289.32, 678.32).labelled("h9")).unwrap();
        b.add_waypoint(WaypointSpec::exit("p200", 287.76, 724.44).labelled("Exit 1")).unwrap();
        b.add_waypoint(WaypointSpec::junction("p135", 254.48, 200.32).labelled("h10")).unwrap();
        b.add_waypoint(WaypointSpec::junction("p101", 254.4, 421.0).labelled("h20")).unwrap();
        b.add_waypoint(WaypointSpec::junction("p130", 252.56, 678.32).labelled("h5")).unwrap();
        b.add_waypoint(WaypointSpec::room("p69", 300.0, 420.0, "1063")).unwrap();

        for (x, y) in [("p129", "p100"), ("p100", "p133"), ("p133", "p134"), ("p134", "p200")] {
            b.connect(x, y).unwrap();
        }
        if with_loop {
            for (x, y) in [("p135", "p129"), ("p101", "p135"), ("p130", "p101"), ("p134", "p130")] {
                b.connect(x, y).unwrap();
            }
        }
        b.build()
    }

    pub fn ids(graph: &WaypointGraph, keys: &[&str]) -> Vec<NodeId> {
        keys.iter().map(|k| graph.node(k).unwrap()).collect()
    }

    /// Two exits at equal distance either side of a hub.
    ///
    /// ```text
    /// p200 ── w1 ── p129 ── e1 ── p201
    /// ```
    pub fn twin_exits() -> WaypointGraph {
        let mut b = WaypointGraphBuilder::new();
        b.add_waypoint(WaypointSpec::junction("p129", 0.0, 0.0)).unwrap();
        b.add_waypoint(WaypointSpec::junction("w1", -10.0, 0.0)).unwrap();
        b.add_waypoint(WaypointSpec::junction("e1", 10.0, 0.0)).unwrap();
        b.add_waypoint(WaypointSpec::exit("p200", -20.0, 0.0)).unwrap();
        b.add_waypoint(WaypointSpec::exit("p201", 20.0, 0.0)).unwrap();
        b.connect("p129", "w1").unwrap();
        b.connect("w1", "p200").unwrap();
        b.connect("p129", "e1").unwrap();
        b.connect("e1", "p201").unwrap();
        b.build()
    }
}

// ── Builder & graph structure ─────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use evac_core::{NodeId, Point, WaypointKind};
    use crate::{SpatialError, WaypointGraph, WaypointGraphBuilder, WaypointSpec};

    #[test]
    fn empty_graph() {
        let g = WaypointGraph::empty();
        assert!(g.is_empty());
        assert_eq!(g.edge_count(), 0);
        assert!(g.exits().is_empty());
        assert_eq!(g.snap(Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn corridors_are_bidirectional() {
        let g = super::helpers::west_wing(false);
        assert_eq!(g.corridor_count(), 4);
        assert_eq!(g.edge_count(), 8);
        let p100 = g.node("p100").unwrap();
        let p129 = g.node("p129").unwrap();
        assert!(g.are_adjacent(p100, p129));
        assert!(g.are_adjacent(p129, p100));
    }

    #[test]
    fn neighbours_keep_insertion_order() {
        let g = super::helpers::west_wing(true);
        let p134 = g.node("p134").unwrap();
        let keys: Vec<&str> = g.neighbors(p134).map(|n| g.key(n)).collect();
        assert_eq!(keys, ["p133", "p200", "p130"]);
    }

    #[test]
    fn exits_listed_in_table_order() {
        let g = super::helpers::twin_exits();
        let keys: Vec<&str> = g.exits().iter().map(|&n| g.key(n)).collect();
        assert_eq!(keys, ["p200", "p201"]);
        assert_eq!(g.kind(g.exits()[0]), WaypointKind::Exit);
    }

    #[test]
    fn rooms_are_not_navigable() {
        let g = super::helpers::west_wing(false);
        let room = g.node("p69").unwrap();
        assert!(g.contains(room));
        assert!(!g.is_navigable(room));
        assert!(matches!(g.navigable_node("p69"), Err(SpatialError::NotNavigable(_))));
        assert!(matches!(g.navigable_node("p999"), Err(SpatialError::UnknownWaypoint(_))));
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut b = WaypointGraphBuilder::new();
        b.add_waypoint(WaypointSpec::junction("p1", 0.0, 0.0)).unwrap();
        let err = b.add_waypoint(WaypointSpec::junction("p1", 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, SpatialError::DuplicateWaypoint(k) if k == "p1"));
    }

    #[test]
    fn navigable_room_rejected() {
        let mut spec = WaypointSpec::room("p5", 0.0, 0.0, "1001");
        spec.navigable = true;
        let err = WaypointGraphBuilder::new().add_waypoint(spec).unwrap_err();
        assert!(matches!(err, SpatialError::NavigableRoom(_)));
    }

    #[test]
    fn corridor_validation() {
        let mut b = WaypointGraphBuilder::new();
        let a = b.add_waypoint(WaypointSpec::junction("p1", 0.0, 0.0)).unwrap();
        let r = b.add_waypoint(WaypointSpec::room("p2", 1.0, 0.0, "1001")).unwrap();

        assert!(matches!(b.add_corridor(a, a), Err(SpatialError::SelfLoop(_))));
        assert!(matches!(b.add_corridor(a, r), Err(SpatialError::NotNavigable(_))));
        assert!(matches!(b.add_corridor(a, NodeId(7)), Err(SpatialError::InvalidNode(_))));
        assert!(matches!(b.connect("p1", "nope"), Err(SpatialError::UnknownWaypoint(_))));
        assert_eq!(b.corridor_count(), 0);
    }

    #[test]
    fn invalid_node_classification() {
        assert!(SpatialError::InvalidNode(NodeId(3)).is_invalid_node());
        assert!(SpatialError::UnknownWaypoint("x".into()).is_invalid_node());
        assert!(!SpatialError::Parse("bad".into()).is_invalid_node());
    }
}

// ── Spatial lookups ───────────────────────────────────────────────────────────

#[cfg(test)]
mod lookup {
    use evac_core::Point;

    #[test]
    fn snap_picks_nearest_navigable() {
        let g = super::helpers::west_wing(true);
        // Right beside h19, and the room p69 is never a snap target.
        let hit = g.snap(Point::new(325.0, 419.0)).unwrap();
        assert_eq!(g.key(hit), "p100");
    }

    #[test]
    fn mention_by_key_and_label() {
        let g = super::helpers::west_wing(true);
        assert_eq!(g.resolve_mention("p133").map(|n| g.key(n)), Some("p133"));
        assert_eq!(g.resolve_mention("H8").map(|n| g.key(n)), Some("p133"));
        assert_eq!(g.resolve_mention("  h20 ").map(|n| g.key(n)), Some("p101"));
    }

    #[test]
    fn mention_of_room_snaps_to_hallway() {
        let g = super::helpers::west_wing(true);
        // Room 1063 sits at (300, 420); h19 at (331, 421) is closer than h20.
        assert_eq!(g.resolve_mention("1063").map(|n| g.key(n)), Some("p100"));
    }

    #[test]
    fn mention_with_bare_number_tries_p_prefix() {
        let g = super::helpers::west_wing(true);
        assert_eq!(g.resolve_mention("135").map(|n| g.key(n)), Some("p135"));
    }

    #[test]
    fn unknown_mention_is_none() {
        let g = super::helpers::west_wing(true);
        assert_eq!(g.resolve_mention("basement"), None);
        assert_eq!(g.resolve_mention(""), None);
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use evac_core::NodeId;
    use crate::{AStarRouter, Exclusion, Router, SpatialError, WaypointGraphBuilder, WaypointSpec};
    use super::helpers::{ids, west_wing};

    #[test]
    fn straight_spine() {
        let g = west_wing(false);
        let [s, t] = [g.node("p129").unwrap(), g.node("p200").unwrap()];
        let route = AStarRouter.find_route(&g, s, t, &Exclusion::default()).unwrap();
        assert_eq!(route.nodes, ids(&g, &["p129", "p100", "p133", "p134", "p200"]));
        assert!((route.length_m - g.path_length(&route.nodes)).abs() < 1e-3);
        assert_eq!(route.destination(), Some(t));
    }

    #[test]
    fn shorter_side_chosen_when_loop_open() {
        // East side ≈ 573 m, west loop ≈ 642 m.
        let g = west_wing(true);
        let [s, t] = [g.node("p129").unwrap(), g.node("p200").unwrap()];
        let route = AStarRouter.find_route(&g, s, t, &Exclusion::default()).unwrap();
        assert_eq!(route.nodes, ids(&g, &["p129", "p100", "p133", "p134", "p200"]));
    }

    #[test]
    fn blocked_waypoint_is_avoided() {
        let g = west_wing(true);
        let [s, t] = [g.node("p129").unwrap(), g.node("p200").unwrap()];
        let blocked: Exclusion = [g.node("p133").unwrap()].into_iter().collect();
        let route = AStarRouter.find_route(&g, s, t, &blocked).unwrap();
        assert_eq!(route.nodes, ids(&g, &["p129", "p135", "p101", "p130", "p134", "p200"]));
        assert!(!route.contains(g.node("p133").unwrap()));
    }

    #[test]
    fn exclusions_never_shorten_a_route() {
        let g = west_wing(true);
        let [s, t] = [g.node("p129").unwrap(), g.node("p200").unwrap()];
        let open = AStarRouter.find_route(&g, s, t, &Exclusion::default()).unwrap();
        let mut excluded = Exclusion::default();
        for key in ["p100", "p101"] {
            excluded.insert(g.node(key).unwrap());
            let r = AStarRouter.find_route(&g, s, t, &excluded).unwrap();
            assert!(r.is_empty() || r.length_m >= open.length_m);
        }
    }

    #[test]
    fn off_path_exclusion_changes_nothing() {
        let g = west_wing(true);
        let [s, t] = [g.node("p129").unwrap(), g.node("p200").unwrap()];
        let open = AStarRouter.find_route(&g, s, t, &Exclusion::default()).unwrap();
        for key in ["p101", "p135", "p130"] {
            let excluded: Exclusion = [g.node(key).unwrap()].into_iter().collect();
            let r = AStarRouter.find_route(&g, s, t, &excluded).unwrap();
            assert_eq!(r.nodes, open.nodes, "excluding {key}");
            assert_eq!(r.length_m, open.length_m);
        }
    }

    #[test]
    fn fully_blocked_is_empty_not_error() {
        let g = west_wing(false);
        let [s, t] = [g.node("p129").unwrap(), g.node("p200").unwrap()];
        let blocked: Exclusion = [g.node("p133").unwrap()].into_iter().collect();
        let route = AStarRouter.find_route(&g, s, t, &blocked).unwrap();
        assert!(route.is_empty());
        assert_eq!(route.destination(), None);
    }

    #[test]
    fn blocked_start_can_still_leave() {
        let g = west_wing(false);
        let [s, t] = [g.node("p133").unwrap(), g.node("p200").unwrap()];
        let blocked: Exclusion = [s].into_iter().collect();
        let route = AStarRouter.find_route(&g, s, t, &blocked).unwrap();
        assert_eq!(route.nodes, ids(&g, &["p133", "p134", "p200"]));
    }

    #[test]
    fn start_equals_goal() {
        let g = west_wing(false);
        let s = g.node("p134").unwrap();
        let route = AStarRouter.find_route(&g, s, s, &Exclusion::default()).unwrap();
        assert_eq!(route.nodes, vec![s]);
        assert!(route.is_trivial());
        assert_eq!(route.length_m, 0.0);
    }

    #[test]
    fn room_or_unknown_endpoint_is_invalid() {
        let g = west_wing(false);
        let room = g.node("p69").unwrap();
        let exit = g.node("p200").unwrap();
        let none = Exclusion::default();
        assert!(matches!(
            AStarRouter.find_route(&g, room, exit, &none),
            Err(SpatialError::InvalidNode(n)) if n == room
        ));
        assert!(matches!(
            AStarRouter.find_route(&g, exit, NodeId(500), &none),
            Err(SpatialError::InvalidNode(_))
        ));
    }

    #[test]
    fn equal_cost_ties_break_by_insertion_order() {
        // a ─ b
        // │   │
        // c ─ d      both a→b→d and a→c→d are 20 m.
        let mut b = WaypointGraphBuilder::new();
        let a = b.add_waypoint(WaypointSpec::junction("a", 0.0, 0.0)).unwrap();
        let bb = b.add_waypoint(WaypointSpec::junction("b", 10.0, 0.0)).unwrap();
        let c = b.add_waypoint(WaypointSpec::junction("c", 0.0, 10.0)).unwrap();
        let d = b.add_waypoint(WaypointSpec::exit("d", 10.0, 10.0)).unwrap();
        b.add_corridor(a, bb).unwrap();
        b.add_corridor(a, c).unwrap();
        b.add_corridor(bb, d).unwrap();
        b.add_corridor(c, d).unwrap();
        let g = b.build();

        let none = Exclusion::default();
        let first = AStarRouter.find_route(&g, a, d, &none).unwrap();
        assert_eq!(first.nodes, vec![a, bb, d]);
        for _ in 0..10 {
            assert_eq!(AStarRouter.find_route(&g, a, d, &none).unwrap(), first);
        }
    }
}

// ── Exit selection ────────────────────────────────────────────────────────────

#[cfg(test)]
mod exits {
    use evac_core::NodeId;
    use crate::{AStarRouter, ExitLoad, ExitSelector, Exclusion, Router};
    use super::helpers::{twin_exits, west_wing};

    fn routed_to(g: &crate::WaypointGraph, from: &str, exit: &str) -> Vec<NodeId> {
        AStarRouter
            .find_route(g, g.node(from).unwrap(), g.node(exit).unwrap(), &Exclusion::default())
            .unwrap()
            .nodes
    }

    #[test]
    fn tie_goes_to_first_exit() {
        let g = twin_exits();
        let from = g.node("p129").unwrap();
        let best = ExitSelector::default()
            .best_exit(&AStarRouter, &g, from, &ExitLoad::new())
            .unwrap();
        assert_eq!(best, g.node("p200"));
    }

    #[test]
    fn congestion_penalty_shifts_choice() {
        let g = twin_exits();
        let r1 = routed_to(&g, "w1", "p200");
        let r2 = routed_to(&g, "p129", "p200");
        let r3 = routed_to(&g, "e1", "p201");
        let load = ExitLoad::from_routes([r1.as_slice(), r2.as_slice(), r3.as_slice()]);
        assert_eq!(load.get(g.node("p200").unwrap()), 2);
        assert_eq!(load.get(g.node("p201").unwrap()), 1);
        assert_eq!(load.total(), 3);

        let from = g.node("p129").unwrap();
        let selector = ExitSelector::default();
        assert_eq!(selector.best_exit(&AStarRouter, &g, from, &load).unwrap(), g.node("p201"));

        let ranked = selector.ranked_exits(&AStarRouter, &g, from, &load).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].hops, ranked[0].load, ranked[0].score), (3, 1, 13));
        assert_eq!((ranked[1].hops, ranked[1].load, ranked[1].score), (3, 2, 23));
    }

    #[test]
    fn nearest_ignores_congestion() {
        let g = twin_exits();
        let from = g.node("e1").unwrap();
        let heavy = ExitLoad::from_routes([routed_to(&g, "e1", "p201").as_slice(); 1]);
        let selector = ExitSelector::new(1_000);
        assert_eq!(selector.nearest_exit(&AStarRouter, &g, from).unwrap(), g.node("p201"));
        assert_eq!(selector.best_exit(&AStarRouter, &g, from, &heavy).unwrap(), g.node("p200"));
    }

    #[test]
    fn unreachable_exits_skipped() {
        let g = west_wing(false);
        // p135 has no corridors in the spine-only graph.
        let from = g.node("p135").unwrap();
        let selector = ExitSelector::default();
        assert!(selector.ranked_exits(&AStarRouter, &g, from, &ExitLoad::new()).unwrap().is_empty());
        assert_eq!(selector.best_exit(&AStarRouter, &g, from, &ExitLoad::new()).unwrap(), None);
    }

    #[test]
    fn empty_routes_do_not_count() {
        let load = ExitLoad::from_routes([&[][..], &[NodeId(4)][..]]);
        assert_eq!(load.total(), 1);
        assert_eq!(load.get(NodeId(4)), 1);
    }
}

// ── Directions ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod directions {
    use evac_core::Point;
    use crate::{DirectionSynthesizer, Turn};
    use super::helpers::{ids, west_wing};

    #[test]
    fn spine_walkthrough() {
        let g = west_wing(false);
        let route = ids(&g, &["p129", "p100", "p133", "p134", "p200"]);
        let steps = DirectionSynthesizer::default().synthesize(&g, &route);

        let texts: Vec<&str> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "Proceed straight for 220 meters to h19.",
                "Continue straight for 257 meters to h8.",
                "Turn left and proceed 48 meters to h9.",
                "Turn right and proceed 46 meters to Exit 1.",
                "You have arrived at Exit 1.",
            ]
        );

        let dirs: Vec<Turn> = steps.iter().map(|s| s.direction).collect();
        assert_eq!(dirs, [Turn::Straight, Turn::Straight, Turn::Left, Turn::Right, Turn::Arrive]);
        assert_eq!(steps.last().unwrap().distance_m, 0.0);
    }

    #[test]
    fn short_routes_have_no_steps() {
        let g = west_wing(false);
        let synth = DirectionSynthesizer::default();
        assert!(synth.synthesize(&g, &[]).is_empty());
        assert!(synth.synthesize(&g, &ids(&g, &["p129"])).is_empty());
    }

    #[test]
    fn threshold_is_configurable() {
        let prev = Point::new(0.0, 0.0);
        let at = Point::new(10.0, 0.0);
        let next = Point::new(20.0, 5.0); // ≈ 26.6°
        assert_eq!(DirectionSynthesizer::default().classify(prev, at, next), Turn::Straight);
        assert_eq!(DirectionSynthesizer::new(20.0).classify(prev, at, next), Turn::Left);
        assert_eq!(DirectionSynthesizer::new(20.0).classify(next, at, prev), Turn::Right);
    }

    #[test]
    fn turn_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Turn::Arrive).unwrap(), "\"arrive\"");
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;
    use std::path::PathBuf;

    use crate::{load_graph_csv, load_graph_reader, AStarRouter, Exclusion, Router, SpatialError};

    const WAYPOINTS: &str = "\
id,x,y,label,kind,navigable
p1,0,0,h1,JUNCTION,true
p2,30,40,,EXIT,true
p3,5,5,1001,ROOM,false
";

    #[test]
    fn reader_builds_graph() {
        let g = load_graph_reader(Cursor::new(WAYPOINTS), Cursor::new("a,b\np1,p2\n")).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.corridor_count(), 1);
        let p2 = g.node("p2").unwrap();
        assert_eq!(g.label(p2), "p2", "empty label falls back to id");
        assert_eq!(g.exits(), &[p2]);
        assert!((g.distance(g.node("p1").unwrap(), p2) - 50.0).abs() < 1e-4);
        assert_eq!(
            format!("{g:?}"),
            "WaypointGraph { waypoints: 3, corridors: 1, exits: 1, .. }"
        );
    }

    #[test]
    fn corridor_to_room_rejected() {
        let err = load_graph_reader(Cursor::new(WAYPOINTS), Cursor::new("a,b\np1,p3\n")).unwrap_err();
        assert!(matches!(err, SpatialError::NotNavigable(_)));
    }

    #[test]
    fn bad_kind_is_parse_error() {
        let rows = "id,x,y,label,kind,navigable\np1,0,0,h1,STAIRS,true\n";
        let err = load_graph_reader(Cursor::new(rows), Cursor::new("a,b\n")).unwrap_err();
        assert!(matches!(err, SpatialError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let missing = PathBuf::from("/nonexistent/waypoints.csv");
        assert!(matches!(load_graph_csv(&missing, &missing), Err(SpatialError::Io(_))));
    }

    #[test]
    fn floor_one_map() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/floor1");
        let g = load_graph_csv(&dir.join("waypoints.csv"), &dir.join("edges.csv")).unwrap();
        assert_eq!(g.node_count(), 120);
        assert_eq!(g.corridor_count(), 27);
        let exits: Vec<&str> = g.exits().iter().map(|&n| g.key(n)).collect();
        assert_eq!(exits, ["p200", "p201", "p202", "p203"]);

        let [s, t] = [g.node("p129").unwrap(), g.node("p200").unwrap()];
        let blocked: Exclusion = [g.node("p133").unwrap()].into_iter().collect();
        let route = AStarRouter.find_route(&g, s, t, &blocked).unwrap();
        assert_eq!(route.nodes.first(), Some(&s));
        assert_eq!(route.destination(), Some(t));
        assert!(!route.contains(g.node("p133").unwrap()));
        assert!(route.nodes.windows(2).all(|w| g.are_adjacent(w[0], w[1])));
    }
}
