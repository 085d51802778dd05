//! Small closed vocabularies shared across crates.
//!
//! All enums serialize in upper case (`"EXIT"`, `"CRITICAL"`, `"NO_ROUTE"`)
//! to match the static map tables and the session event contract.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a waypoint represents on the floor plan.
///
/// Only `Junction` and `Exit` waypoints take part in routing; rooms are
/// informational markers that can be referred to by label.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaypointKind {
    Room,
    Junction,
    Exit,
}

impl WaypointKind {
    #[inline]
    pub fn is_exit(self) -> bool {
        matches!(self, WaypointKind::Exit)
    }
}

/// How severe a reported obstruction is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low      => "LOW",
            Severity::Medium   => "MEDIUM",
            Severity::High     => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// What kind of obstruction was reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Fire,
    Debris,
    Crowd,
    Structural,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Fire       => "FIRE",
            Category::Debris     => "DEBRIS",
            Category::Crowd      => "CROWD",
            Category::Structural => "STRUCTURAL",
            Category::Other      => "OTHER",
        }
    }
}

/// Lifecycle of an occupant session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OccupantStatus {
    #[default]
    Active,
    Arrived,
    Disconnected,
}

/// Machine-readable code attached to every error sent to a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidNode,
    NoRoute,
    MalformedReport,
    UnknownSession,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidNode     => "INVALID_NODE",
            ErrorCode::NoRoute         => "NO_ROUTE",
            ErrorCode::MalformedReport => "MALFORMED_REPORT",
            ErrorCode::UnknownSession  => "UNKNOWN_SESSION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
