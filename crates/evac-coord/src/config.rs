//! Engine tunables.

use serde::{Deserialize, Serialize};

use evac_spatial::ExitSelector;

/// Tunables for exit choice and direction output.  Every field has a
/// default, so an empty `[engine]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Score penalty per occupant already routed to an exit.
    pub congestion_weight: u32,

    /// Turns sharper than this many degrees are spoken as left/right.
    pub straight_threshold_deg: f32,

    /// Attach turn-by-turn directions to every route-assigned event.
    pub include_directions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            congestion_weight:      ExitSelector::DEFAULT_CONGESTION_WEIGHT,
            straight_threshold_deg: 30.0,
            include_directions:     true,
        }
    }
}
