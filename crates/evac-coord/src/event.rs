//! The session event contract.
//!
//! Both directions serialize as JSON objects tagged by `event`
//! (`"join"`, `"route_assigned"`, …) with camelCase fields.  Waypoints
//! travel as string keys; `NodeId`s never leave the engine.
//!
//! | Inbound           | Answer                                                        |
//! |-------------------|---------------------------------------------------------------|
//! | *connect*         | `session_confirmed` to the session                            |
//! | *disconnect*      | `user_left` to everyone else                                  |
//! | `join`            | `route_assigned` or `error`; `user_joined` to everyone else   |
//! | `position_update` | `user_position` to everyone else                              |
//! | `report_blockage` | `blockage_alert` + `route_assigned`/`error` to each affected session, then `blockage_added` to all |
//! | `request_reroute` | `route_assigned` or `error`                                   |
//! | `clear_blockage`  | `blockage_cleared` to all                                     |
//!
//! Connect and disconnect come from the transport itself, so they are
//! service methods rather than `Inbound` variants.

use serde::{Deserialize, Serialize};

use evac_core::{Category, ErrorCode, EvacError, SessionId, Severity, Timestamp};
use evac_spatial::Instruction;

// ── Inbound ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Inbound {
    Join {
        /// Defaults to `User-<session prefix>`.
        #[serde(default)]
        name:           Option<String>,
        start_waypoint: String,
    },
    PositionUpdate {
        current_waypoint: String,
        #[serde(default)]
        progress:         usize,
    },
    ReportBlockage {
        message: String,
    },
    RequestReroute,
    ClearBlockage {
        location: String,
    },
}

impl Inbound {
    /// Event name, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Join { .. }           => "join",
            Inbound::PositionUpdate { .. } => "position_update",
            Inbound::ReportBlockage { .. } => "report_blockage",
            Inbound::RequestReroute        => "request_reroute",
            Inbound::ClearBlockage { .. }  => "clear_blockage",
        }
    }
}

// ── Outbound ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Outbound {
    SessionConfirmed {
        session_id: SessionId,
        timestamp:  Timestamp,
    },
    UserJoined {
        session_id: SessionId,
        name:       String,
        position:   String,
        timestamp:  Timestamp,
    },
    UserLeft {
        session_id: SessionId,
        name:       String,
        timestamp:  Timestamp,
    },
    RouteAssigned {
        session_id:  SessionId,
        route:       Vec<String>,
        destination: Option<String>,
        reason:      String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        directions:  Vec<Instruction>,
        timestamp:   Timestamp,
    },
    UserPosition {
        session_id:       SessionId,
        name:             String,
        current_waypoint: String,
        progress:         usize,
        timestamp:        Timestamp,
    },
    BlockageAlert {
        location:   String,
        /// Whole metres from the recipient to the blockage.
        distance_m: u32,
        severity:   Severity,
        #[serde(rename = "type")]
        category:   Category,
        message:    String,
        timestamp:  Timestamp,
    },
    BlockageAdded {
        location:       String,
        severity:       Severity,
        #[serde(rename = "type")]
        category:       Category,
        message:        String,
        reported_by:    String,
        affected_users: usize,
        rerouted_users: usize,
        timestamp:      Timestamp,
    },
    BlockageCleared {
        location:  String,
        timestamp: Timestamp,
    },
    Error {
        code:    ErrorCode,
        message: String,
    },
}

impl Outbound {
    pub fn error(err: &EvacError) -> Self {
        Outbound::Error { code: err.code(), message: err.to_string() }
    }

    /// Event name as it appears in the `event` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::SessionConfirmed { .. } => "session_confirmed",
            Outbound::UserJoined { .. }       => "user_joined",
            Outbound::UserLeft { .. }         => "user_left",
            Outbound::RouteAssigned { .. }    => "route_assigned",
            Outbound::UserPosition { .. }     => "user_position",
            Outbound::BlockageAlert { .. }    => "blockage_alert",
            Outbound::BlockageAdded { .. }    => "blockage_added",
            Outbound::BlockageCleared { .. }  => "blockage_cleared",
            Outbound::Error { .. }            => "error",
        }
    }
}
