//! `evac-coord` — the coordination layer of the evac routing engine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`config`]    | `EngineConfig`                                               |
//! | [`event`]     | `Inbound` / `Outbound` session event contract                |
//! | [`notifier`]  | `Notifier` trait, `NoopNotifier`, `RecordingNotifier`        |
//! | [`planner`]   | `RoutePlanner`, `Plan` (exit choice + obstructed routing)    |
//! | [`reroute`]   | `RerouteCoordinator`, `RerouteSummary`                       |
//! | [`service`]   | `EvacService`, `EvacServiceBuilder`                          |
//! | [`views`]     | `Stats`, `RouteProbe`, `ExitRanking`, mirror records          |
//! | [`error`]     | `CoordError`, `CoordResult<T>`                               |
//!
//! # Usage
//!
//! ```rust,ignore
//! let service = EvacServiceBuilder::new(graph, AStarRouter)
//!     .config(EngineConfig::default())
//!     .notifier(Arc::new(my_transport))
//!     .build()?;
//!
//! service.connect(&sid);
//! service.handle(&sid, Inbound::Join { name: None, start_waypoint: "p129".into() });
//! ```
//!
//! Every handler takes `&self`; one `EvacService` is shared by all sessions.

pub mod config;
pub mod error;
pub mod event;
pub mod notifier;
pub mod planner;
pub mod reroute;
pub mod service;
pub mod views;


pub use config::EngineConfig;
pub use error::{CoordError, CoordResult};
pub use event::{Inbound, Outbound};
pub use notifier::{Delivery, NoopNotifier, Notifier, Recipient, RecordingNotifier};
pub use planner::{Plan, RoutePlanner};
pub use reroute::{RerouteCoordinator, RerouteSummary};
pub use service::{EvacService, EvacServiceBuilder};
pub use views::{ExitRanking, ObstructionRecord, OccupantRecord, OccupantSummary, RouteProbe, Stats};
