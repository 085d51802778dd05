//! Unit tests for evac-registry.

#[cfg(test)]
mod occupants {
    use evac_core::{NodeId, OccupantStatus, SessionId};
    use crate::OccupantRegistry;

    fn sid(s: &str) -> SessionId {
        SessionId::new(s)
    }

    #[test]
    fn create_and_get() {
        let reg = OccupantRegistry::new();
        let o = reg.create(sid("a"), "Ana", NodeId(3));
        assert_eq!(o.current, NodeId(3));
        assert!(o.route.is_empty());
        assert_eq!(o.status, OccupantStatus::Active);
        assert_eq!(reg.get(&sid("a")), Some(o));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn rejoin_replaces_record() {
        let reg = OccupantRegistry::new();
        reg.create(sid("a"), "Ana", NodeId(3));
        reg.update_route(&sid("a"), vec![NodeId(3), NodeId(4)]);
        reg.create(sid("a"), "Ana B", NodeId(5));
        let o = reg.get(&sid("a")).unwrap();
        assert_eq!(o.name, "Ana B");
        assert_eq!(o.current, NodeId(5));
        assert!(o.route.is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn snapshot_ordered_by_session() {
        let reg = OccupantRegistry::new();
        for s in ["c", "a", "b"] {
            reg.create(sid(s), s, NodeId(0));
        }
        let order: Vec<String> = reg.all().iter().map(|o| o.session.to_string()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn updates_on_missing_session_are_noops() {
        let reg = OccupantRegistry::new();
        assert_eq!(reg.update_position(&sid("ghost"), NodeId(1), 0), None);
        assert!(!reg.update_route(&sid("ghost"), vec![NodeId(1)]));
        assert!(!reg.mark_stale(&sid("ghost")));
        assert!(reg.is_empty());
    }

    #[test]
    fn reaching_route_end_marks_arrived() {
        let reg = OccupantRegistry::new();
        reg.create(sid("a"), "Ana", NodeId(1));
        reg.update_route(&sid("a"), vec![NodeId(1), NodeId(2), NodeId(9)]);

        let mid = reg.update_position(&sid("a"), NodeId(2), 1).unwrap();
        assert_eq!(mid.status, OccupantStatus::Active);
        let end = reg.update_position(&sid("a"), NodeId(9), 2).unwrap();
        assert_eq!(end.status, OccupantStatus::Arrived);
        assert_eq!(reg.active_count(), 0);
    }

    #[test]
    fn route_update_clears_stale_and_progress() {
        let reg = OccupantRegistry::new();
        reg.create(sid("a"), "Ana", NodeId(1));
        reg.update_route(&sid("a"), vec![NodeId(1), NodeId(9)]);
        reg.update_position(&sid("a"), NodeId(1), 1);
        assert!(reg.mark_stale(&sid("a")));
        assert!(reg.get(&sid("a")).unwrap().route_stale);

        reg.update_route(&sid("a"), vec![NodeId(1), NodeId(7)]);
        let o = reg.get(&sid("a")).unwrap();
        assert!(!o.route_stale);
        assert_eq!(o.progress, 0);
        assert_eq!(o.destination(), Some(NodeId(7)));
    }

    #[test]
    fn single_waypoint_route_at_exit_is_arrived() {
        let reg = OccupantRegistry::new();
        reg.create(sid("a"), "Ana", NodeId(9));
        reg.update_route(&sid("a"), vec![NodeId(9)]);
        assert_eq!(reg.get(&sid("a")).unwrap().status, OccupantStatus::Arrived);
    }

    #[test]
    fn remove_returns_disconnected_record() {
        let reg = OccupantRegistry::new();
        reg.create(sid("a"), "Ana", NodeId(1));
        let gone = reg.remove(&sid("a")).unwrap();
        assert_eq!(gone.status, OccupantStatus::Disconnected);
        assert!(!reg.contains(&sid("a")));
        assert_eq!(reg.remove(&sid("a")), None);
        // A late reroute for the removed session is dropped.
        assert!(!reg.update_route(&sid("a"), vec![NodeId(1)]));
        assert!(reg.is_empty());
    }

    #[test]
    fn exit_load_counts_route_ends() {
        let reg = OccupantRegistry::new();
        reg.create(sid("a"), "a", NodeId(0));
        reg.create(sid("b"), "b", NodeId(0));
        reg.create(sid("c"), "c", NodeId(0));
        reg.update_route(&sid("a"), vec![NodeId(0), NodeId(8)]);
        reg.update_route(&sid("b"), vec![NodeId(0), NodeId(8)]);
        reg.update_route(&sid("c"), vec![NodeId(0), NodeId(9)]);
        let load = reg.exit_load();
        assert_eq!(load.get(NodeId(8)), 2);
        assert_eq!(load.get(NodeId(9)), 1);
    }

    #[test]
    fn concurrent_joins_and_leaves() {
        use std::sync::Arc;
        let reg = Arc::new(OccupantRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let s = sid(&format!("t{t}-{i}"));
                        reg.create(s.clone(), "x", NodeId(0));
                        if i % 2 == 0 {
                            reg.remove(&s);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.len(), 8 * 25);
    }
}

#[cfg(test)]
mod obstructions {
    use evac_core::{Category, NodeId, SessionId, Severity, now};
    use crate::{Obstruction, ObstructionRegistry};

    fn blockage(node: u32, severity: Severity) -> Obstruction {
        Obstruction {
            waypoint:      NodeId(node),
            severity,
            category:      Category::Fire,
            reporter:      Some(SessionId::new("r")),
            reporter_name: Some("Reporter".into()),
            message:       "smoke".into(),
            reported_at:   now(),
        }
    }

    #[test]
    fn add_then_query() {
        let reg = ObstructionRegistry::new();
        assert!(reg.add(blockage(4, Severity::High)));
        assert!(reg.is_blocked(NodeId(4)));
        assert!(!reg.is_blocked(NodeId(5)));
        assert!(reg.blocked_set().contains(&NodeId(4)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn repeat_report_replaces_metadata() {
        let reg = ObstructionRegistry::new();
        assert!(reg.add(blockage(4, Severity::Medium)));
        assert!(!reg.add(blockage(4, Severity::Critical)));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(NodeId(4)).unwrap().severity, Severity::Critical);
    }

    #[test]
    fn clear_is_idempotent() {
        let reg = ObstructionRegistry::new();
        assert_eq!(reg.remove(NodeId(4)), None);
        reg.add(blockage(4, Severity::High));
        assert!(reg.remove(NodeId(4)).is_some());
        assert_eq!(reg.remove(NodeId(4)), None);
        assert!(reg.is_empty());
        assert!(reg.blocked_set().is_empty());
    }

    #[test]
    fn all_in_waypoint_order() {
        let reg = ObstructionRegistry::new();
        for n in [9, 2, 5] {
            reg.add(blockage(n, Severity::Low));
        }
        let order: Vec<u32> = reg.all().iter().map(|o| o.waypoint.0).collect();
        assert_eq!(order, [2, 5, 9]);
    }

    #[test]
    fn generation_moves_on_every_change() {
        let reg = ObstructionRegistry::new();
        assert_eq!(reg.generation(), 0);
        reg.add(blockage(4, Severity::High));
        reg.add(blockage(4, Severity::Critical));
        assert_eq!(reg.generation(), 2);

        let (generation, blocked) = reg.snapshot();
        assert_eq!(generation, 2);
        assert!(blocked.contains(&NodeId(4)));

        reg.remove(NodeId(7));
        assert_eq!(reg.generation(), 2, "clearing an unblocked waypoint is not a change");
        reg.remove(NodeId(4));
        assert_eq!(reg.generation(), 3);
    }
}

#[cfg(test)]
mod mirror {
    use evac_core::SessionId;
    use crate::{
        MemoryMirror, NoopMirror, RegistryResult, StateMirror, delete_logged, obstruction_key,
        occupant_key, put_json,
    };

    struct FailingMirror;

    impl StateMirror for FailingMirror {
        fn put(&self, _key: &str, _value: &str) -> RegistryResult<()> {
            Err(serde_json::from_str::<u8>("x").unwrap_err().into())
        }
        fn delete(&self, _key: &str) -> RegistryResult<()> {
            Err(serde_json::from_str::<u8>("x").unwrap_err().into())
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn key_shapes() {
        assert_eq!(occupant_key(&SessionId::new("s1")), "occupant:s1");
        assert_eq!(obstruction_key("p133"), "obstruction:p133");
    }

    #[test]
    fn memory_mirror_round_trip() {
        let m = MemoryMirror::new();
        put_json(&m, "occupant:s1", &serde_json::json!({"name": "Ana"}));
        assert_eq!(m.get("occupant:s1").as_deref(), Some(r#"{"name":"Ana"}"#));
        delete_logged(&m, "occupant:s1");
        assert!(m.is_empty());
    }

    #[test]
    fn failures_are_swallowed() {
        put_json(&FailingMirror, "k", &1);
        delete_logged(&FailingMirror, "k");
        put_json(&NoopMirror, "k", &1);
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod sqlite {
    use crate::{SqliteMirror, StateMirror};

    #[test]
    fn upsert_and_delete() {
        let m = SqliteMirror::in_memory().unwrap();
        m.put("obstruction:p133", r#"{"severity":"HIGH"}"#).unwrap();
        m.put("obstruction:p133", r#"{"severity":"CRITICAL"}"#).unwrap();
        assert_eq!(m.len().unwrap(), 1);
        assert_eq!(
            m.get("obstruction:p133").unwrap().as_deref(),
            Some(r#"{"severity":"CRITICAL"}"#)
        );
        m.delete("obstruction:p133").unwrap();
        assert_eq!(m.get("obstruction:p133").unwrap(), None);
    }

    #[test]
    fn file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let m = SqliteMirror::open(&path).unwrap();
            m.put("occupant:a", "{}").unwrap();
        }
        let m = SqliteMirror::open(&path).unwrap();
        assert_eq!(m.get("occupant:a").unwrap().as_deref(), Some("{}"));
    }
}
