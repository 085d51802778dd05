//! The engine facade shared by every session.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use evac_core::{EvacError, EvacResult, NodeId, SessionId, now};
use evac_registry::{
    NoopMirror, Obstruction, ObstructionRegistry, OccupantRegistry, StateMirror, delete_logged,
    obstruction_key, occupant_key, put_json,
};
use evac_report::{KeywordInterpreter, ReportInterpreter};
use evac_spatial::{
    AStarRouter, DirectionSynthesizer, Exclusion, ExitSelector, Instruction, Router, SpatialError,
    WaypointGraph,
};

use crate::config::EngineConfig;
use crate::event::{Inbound, Outbound};
use crate::notifier::{NoopNotifier, Notifier};
use crate::planner::RoutePlanner;
use crate::reroute::RerouteCoordinator;
use crate::views::{ExitRanking, ObstructionRecord, OccupantRecord, RouteProbe, Stats};
use crate::{CoordError, CoordResult};

const JOIN_REASON:    &str = "Initial evacuation route";
const REQUEST_REASON: &str = "Rerouted on request";

fn invalid_node(key: &str) -> impl Fn(SpatialError) -> EvacError + '_ {
    move |e| {
        debug!(waypoint = key, error = %e, "waypoint_rejected");
        EvacError::InvalidNode(key.to_string())
    }
}

// ── EvacServiceBuilder ────────────────────────────────────────────────────────

/// Fluent builder for [`EvacService`].
///
/// | Method             | Default               |
/// |--------------------|-----------------------|
/// | `.config(c)`       | `EngineConfig::default()` |
/// | `.interpreter(i)`  | `KeywordInterpreter`  |
/// | `.notifier(n)`     | `NoopNotifier`        |
/// | `.mirror(m)`       | `NoopMirror`          |
pub struct EvacServiceBuilder<R: Router> {
    graph:       WaypointGraph,
    router:      R,
    config:      EngineConfig,
    interpreter: Option<Box<dyn ReportInterpreter>>,
    notifier:    Option<Arc<dyn Notifier>>,
    mirror:      Option<Arc<dyn StateMirror>>,
}

impl<R: Router> EvacServiceBuilder<R> {
    pub fn new(graph: WaypointGraph, router: R) -> Self {
        Self {
            graph,
            router,
            config:      EngineConfig::default(),
            interpreter: None,
            notifier:    None,
            mirror:      None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn interpreter(mut self, interpreter: impl ReportInterpreter + 'static) -> Self {
        self.interpreter = Some(Box::new(interpreter));
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn mirror(mut self, mirror: Arc<dyn StateMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Validate the configuration and return a ready service.
    pub fn build(self) -> CoordResult<EvacService<R>> {
        let threshold = self.config.straight_threshold_deg;
        if !(threshold > 0.0 && threshold < 180.0) {
            return Err(CoordError::Config(format!(
                "straight_threshold_deg must be within (0, 180), got {threshold}"
            )));
        }

        let interpreter = self.interpreter.unwrap_or_else(|| Box::new(KeywordInterpreter::new()));
        info!(
            waypoints   = self.graph.node_count(),
            corridors   = self.graph.corridor_count(),
            exits       = self.graph.exits().len(),
            interpreter = interpreter.name(),
            "service_built"
        );

        Ok(EvacService {
            graph:              self.graph,
            router:             self.router,
            selector:           ExitSelector::new(self.config.congestion_weight),
            synthesizer:        DirectionSynthesizer::new(threshold),
            include_directions: self.config.include_directions,
            occupants:          OccupantRegistry::new(),
            obstructions:       ObstructionRegistry::new(),
            interpreter,
            notifier:           self.notifier.unwrap_or_else(|| Arc::new(NoopNotifier)),
            mirror:             self.mirror.unwrap_or_else(|| Arc::new(NoopMirror)),
            assign_lock:        Mutex::new(()),
        })
    }
}

// ── EvacService ───────────────────────────────────────────────────────────────

/// Owns the map, both registries and the collaborators.  All handlers take
/// `&self`; share one service between sessions behind an `Arc`.
///
/// # Consistency
///
/// Registry operations are individually atomic.  Operations that decide a
/// route from registry state and then store it (join, manual reroute,
/// blockage reroute) route without locks and take `assign_lock` only to
/// store, re-planning if the blocked set changed meanwhile (see
/// [`RerouteCoordinator::plan_and_commit`]).  Routing for different sessions
/// therefore runs concurrently, yet a route planned against an older blocked
/// set is never stored.  Position updates and disconnects do not take the
/// lock.
pub struct EvacService<R: Router = AStarRouter> {
    graph:              WaypointGraph,
    router:             R,
    selector:           ExitSelector,
    synthesizer:        DirectionSynthesizer,
    include_directions: bool,
    occupants:          OccupantRegistry,
    obstructions:       ObstructionRegistry,
    interpreter:        Box<dyn ReportInterpreter>,
    notifier:           Arc<dyn Notifier>,
    mirror:             Arc<dyn StateMirror>,
    assign_lock:        Mutex<()>,
}

impl<R: Router> EvacService<R> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    pub fn occupants(&self) -> &OccupantRegistry {
        &self.occupants
    }

    pub fn obstructions(&self) -> &ObstructionRegistry {
        &self.obstructions
    }

    fn planner(&self) -> RoutePlanner<'_, R> {
        RoutePlanner::new(&self.graph, &self.router, self.selector)
    }

    fn coordinator(&self) -> RerouteCoordinator<'_, R> {
        RerouteCoordinator {
            planner:      self.planner(),
            occupants:    &self.occupants,
            obstructions: &self.obstructions,
            assign_lock:  &self.assign_lock,
            notifier:     &*self.notifier,
            mirror:       &*self.mirror,
            directions:   self.include_directions.then_some(self.synthesizer),
        }
    }

    fn waypoint(&self, key: &str) -> EvacResult<NodeId> {
        self.graph.navigable_node(key).map_err(invalid_node(key))
    }

    fn mirror_occupant(&self, session: &SessionId) {
        if let Some(occupant) = self.occupants.get(session) {
            put_json(
                &*self.mirror,
                &occupant_key(session),
                &OccupantRecord::new(&self.graph, &occupant),
            );
        }
    }

    // ── Transport lifecycle ───────────────────────────────────────────────

    pub fn connect(&self, session: &SessionId) {
        info!(session = %session, "session_connected");
        self.notifier.send(
            session,
            &Outbound::SessionConfirmed { session_id: session.clone(), timestamp: now() },
        );
    }

    /// Drop the session's occupant, if any, and tell everyone else.
    pub fn disconnect(&self, session: &SessionId) {
        let name = match self.occupants.remove(session) {
            Some(occupant) => {
                delete_logged(&*self.mirror, &occupant_key(session));
                info!(session = %session, name = %occupant.name, "occupant_left");
                occupant.name
            }
            None => {
                debug!(session = %session, "session_left_without_joining");
                "Unknown".to_string()
            }
        };
        self.notifier.broadcast(
            &Outbound::UserLeft { session_id: session.clone(), name, timestamp: now() },
            Some(session),
        );
    }

    // ── Inbound events ────────────────────────────────────────────────────

    /// Handle one inbound event.  On failure the error is also sent to
    /// `session` as an `error` event.
    pub fn handle(&self, session: &SessionId, event: Inbound) -> EvacResult<()> {
        let kind = event.kind();
        debug!(session = %session, event = kind, "event_received");

        let result = match event {
            Inbound::Join { name, start_waypoint } => self.join(session, name, &start_waypoint),
            Inbound::PositionUpdate { current_waypoint, progress } => {
                self.position_update(session, &current_waypoint, progress)
            }
            Inbound::ReportBlockage { message } => self.report_blockage(session, &message),
            Inbound::RequestReroute              => self.request_reroute(session),
            Inbound::ClearBlockage { location }  => self.clear_blockage(&location),
        };

        if let Err(e) = &result {
            warn!(session = %session, event = kind, code = e.code().as_str(), error = %e, "event_failed");
            self.notifier.send(session, &Outbound::error(e));
        }
        result
    }

    /// Register the session at `start_waypoint` and assign its first route.
    ///
    /// The occupant is registered even when no exit is reachable; it then
    /// holds an empty route and the call fails with `NO_ROUTE`.
    pub fn join(&self, session: &SessionId, name: Option<String>, start_waypoint: &str) -> EvacResult<()> {
        let start = self.waypoint(start_waypoint)?;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("User-{}", session.short()));

        self.occupants.create(session.clone(), name.clone(), start);

        let coordinator = self.coordinator();
        let planned = coordinator.plan_and_commit(
            self.obstructions.snapshot(),
            |blocked| self.planner().plan(start, &self.occupants.exit_load(), blocked),
            |planned, _| {
                match &planned {
                    Ok(plan) => {
                        coordinator.assign(session, plan.route.nodes.clone(), JOIN_REASON);
                    }
                    Err(_) => self.mirror_occupant(session),
                }
                planned
            },
        );

        info!(
            session = %session,
            name = %name,
            start = start_waypoint,
            exit = planned.as_ref().ok().map(|p| self.graph.key(p.exit)),
            "occupant_joined"
        );
        self.notifier.broadcast(
            &Outbound::UserJoined {
                session_id: session.clone(),
                name,
                position:   start_waypoint.to_string(),
                timestamp:  now(),
            },
            Some(session),
        );
        planned.map(|_| ())
    }

    /// Record a position report and share it.  Reports from sessions that
    /// never joined are ignored.
    pub fn position_update(&self, session: &SessionId, waypoint: &str, progress: usize) -> EvacResult<()> {
        if !self.occupants.contains(session) {
            debug!(session = %session, waypoint, "position_ignored");
            return Ok(());
        }
        let node = self.waypoint(waypoint)?;

        let Some(occupant) = self.occupants.update_position(session, node, progress) else {
            return Ok(());
        };
        put_json(
            &*self.mirror,
            &occupant_key(session),
            &OccupantRecord::new(&self.graph, &occupant),
        );
        debug!(session = %session, waypoint, progress, status = ?occupant.status, "position_updated");

        self.notifier.broadcast(
            &Outbound::UserPosition {
                session_id:       session.clone(),
                name:             occupant.name,
                current_waypoint: waypoint.to_string(),
                progress,
                timestamp:        now(),
            },
            Some(session),
        );
        Ok(())
    }

    /// Interpret a free-text report, block the waypoint it names and
    /// reroute everyone whose route crosses it.
    ///
    /// The location is the interpreter's mention resolved against the map,
    /// or failing that the reporter's current waypoint.  With neither the
    /// report is rejected as `MALFORMED_REPORT`.
    pub fn report_blockage(&self, session: &SessionId, message: &str) -> EvacResult<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(EvacError::MalformedReport("empty report".to_string()));
        }

        let reporter     = self.occupants.get(session);
        let reporter_key = reporter.as_ref().map(|o| self.graph.key(o.current));

        let interpretation = self
            .interpreter
            .interpret(message, reporter_key)
            .map_err(|e| EvacError::MalformedReport(e.to_string()))?;

        let waypoint = interpretation
            .location
            .as_deref()
            .and_then(|mention| self.graph.resolve_mention(mention))
            .or_else(|| reporter.as_ref().map(|o| o.current))
            .ok_or_else(|| EvacError::MalformedReport(format!("no known location in {message:?}")))?;
        let location = self.graph.key(waypoint).to_string();

        let reporter_name = reporter.map(|o| o.name);
        let obstruction = Obstruction {
            waypoint,
            severity:      interpretation.severity,
            category:      interpretation.category,
            reporter:      Some(session.clone()),
            reporter_name: reporter_name.clone(),
            message:       message.to_string(),
            reported_at:   now(),
        };

        let fresh = self.obstructions.add(obstruction.clone());
        put_json(
            &*self.mirror,
            &obstruction_key(&location),
            &ObstructionRecord::new(&self.graph, &obstruction),
        );
        info!(
            location    = %location,
            severity    = %obstruction.severity,
            category    = obstruction.category.as_str(),
            fresh,
            immediate   = interpretation.needs_immediate,
            interpreter = self.interpreter.name(),
            "obstruction_added"
        );

        let summary = self.coordinator().obstruction_added(&obstruction);

        self.notifier.broadcast(
            &Outbound::BlockageAdded {
                location,
                severity:       obstruction.severity,
                category:       obstruction.category,
                message:        obstruction.message,
                reported_by:    reporter_name.unwrap_or_else(|| "Unknown".to_string()),
                affected_users: summary.affected,
                rerouted_users: summary.rerouted,
                timestamp:      now(),
            },
            None,
        );
        Ok(())
    }

    /// Plan a fresh route from the session's current waypoint.
    ///
    /// When no exit is reachable the old route is kept; it is flagged stale
    /// if it crosses a blocked waypoint.
    pub fn request_reroute(&self, session: &SessionId) -> EvacResult<()> {
        let from = self
            .occupants
            .get(session)
            .ok_or_else(|| EvacError::UnknownSession(session.clone()))?
            .current;

        let coordinator = self.coordinator();
        coordinator.plan_and_commit(
            self.obstructions.snapshot(),
            |blocked| self.planner().plan(from, &self.occupants.exit_load(), blocked),
            |planned, blocked| match planned {
                Ok(plan) => {
                    coordinator.assign(session, plan.route.nodes, REQUEST_REASON);
                    Ok(())
                }
                Err(e) => {
                    let crosses_blockage = self
                        .occupants
                        .get(session)
                        .is_some_and(|o| o.route.iter().any(|n| blocked.contains(n)));
                    if crosses_blockage && self.occupants.mark_stale(session) {
                        self.mirror_occupant(session);
                    }
                    Err(e)
                }
            },
        )
    }

    /// Unblock `location`.  Clearing a waypoint that is not blocked does
    /// nothing.
    pub fn clear_blockage(&self, location: &str) -> EvacResult<()> {
        let waypoint = self.waypoint(location)?;
        match self.obstructions.remove(waypoint) {
            Some(removed) => {
                delete_logged(&*self.mirror, &obstruction_key(location));
                info!(location, severity = %removed.severity, "obstruction_cleared");
                self.notifier.broadcast(
                    &Outbound::BlockageCleared { location: location.to_string(), timestamp: now() },
                    None,
                );
            }
            None => debug!(location, "clear_ignored"),
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Route from `start` to `goal` around exactly `excluded`, ignoring the
    /// live obstruction registry.
    pub fn test_route(&self, start: &str, goal: &str, excluded: &[String]) -> EvacResult<RouteProbe> {
        let start = self.waypoint(start)?;
        let goal  = self.waypoint(goal)?;
        let excluded: Exclusion = excluded
            .iter()
            .map(|key| self.waypoint(key))
            .collect::<EvacResult<_>>()?;

        let route = self.planner().route_to(start, goal, &excluded)?;
        Ok(RouteProbe::new(&self.graph, &route))
    }

    /// Every reachable exit from `from`, scored against the current load.
    pub fn ranked_exits(&self, from: &str) -> EvacResult<Vec<ExitRanking>> {
        let from = self.waypoint(from)?;
        let load = self.occupants.exit_load();
        let ranked = self
            .selector
            .ranked_exits(&self.router, &self.graph, from, &load)
            .map_err(|e| EvacError::InvalidNode(e.to_string()))?;
        Ok(ranked.iter().map(|s| ExitRanking::new(&self.graph, s)).collect())
    }

    /// Turn-by-turn directions from `start` to `goal` around the current
    /// obstructions.
    pub fn directions(&self, start: &str, goal: &str) -> EvacResult<Vec<Instruction>> {
        let from = self.waypoint(start)?;
        let to   = self.waypoint(goal)?;
        let route = self.planner().route_to(from, to, &self.obstructions.blocked_set())?;
        if route.is_empty() {
            return Err(EvacError::NoRoute(start.to_string()));
        }
        Ok(self.synthesizer.synthesize(&self.graph, &route.nodes))
    }

    pub fn stats(&self) -> Stats {
        Stats::collect(&self.graph, &self.occupants.all(), &self.obstructions.all())
    }
}
