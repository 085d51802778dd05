//! Turn-by-turn instructions for a waypoint route.
//!
//! For a route `w0 → w1 → … → wn`:
//!
//! | Step        | Direction                                | Distance        |
//! |-------------|------------------------------------------|-----------------|
//! | `w0 → w1`   | always `straight` ("proceed")            | `|w1 - w0|`     |
//! | `wi → wi+1` | turn at `wi` from `wi-1 → wi → wi+1`     | `|wi+1 - wi|`   |
//! | end         | `arrive`                                 | `0`             |
//!
//! Turns use the signed angle from [`Point::turn_angle_deg`]: magnitude
//! below the threshold is `straight`, positive is `left`, otherwise `right`
//! (plan coordinates, `y` down).

use serde::{Deserialize, Serialize};

use evac_core::{NodeId, Point};

use crate::graph::WaypointGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    Straight,
    Left,
    Right,
    Arrive,
}

/// One spoken/displayed navigation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub direction:  Turn,
    pub distance_m: f32,
    pub text:       String,
}

/// Converts routes into [`Instruction`] sequences.
#[derive(Debug, Clone, Copy)]
pub struct DirectionSynthesizer {
    /// Turns with `|angle|` below this many degrees count as straight.
    pub straight_threshold_deg: f32,
}

impl Default for DirectionSynthesizer {
    fn default() -> Self {
        Self { straight_threshold_deg: 30.0 }
    }
}

impl DirectionSynthesizer {
    pub fn new(straight_threshold_deg: f32) -> Self {
        Self { straight_threshold_deg }
    }

    pub fn classify(&self, prev: Point, at: Point, next: Point) -> Turn {
        let angle = Point::turn_angle_deg(prev, at, next);
        if angle.abs() < self.straight_threshold_deg {
            Turn::Straight
        } else if angle > 0.0 {
            Turn::Left
        } else {
            Turn::Right
        }
    }

    /// Instructions for `route`.  Routes shorter than two waypoints give none.
    pub fn synthesize(&self, graph: &WaypointGraph, route: &[NodeId]) -> Vec<Instruction> {
        if route.len() < 2 {
            return Vec::new();
        }

        let mut steps = Vec::with_capacity(route.len());

        for i in 0..route.len() - 1 {
            let (at, next) = (route[i], route[i + 1]);
            let distance_m = graph.distance(at, next);
            let meters     = distance_m as u32;
            let label      = graph.label(next);

            let (direction, text) = if i == 0 {
                (Turn::Straight, format!("Proceed straight for {meters} meters to {label}."))
            } else {
                let turn = self.classify(graph.pos(route[i - 1]), graph.pos(at), graph.pos(next));
                let text = match turn {
                    Turn::Straight => format!("Continue straight for {meters} meters to {label}."),
                    Turn::Left     => format!("Turn left and proceed {meters} meters to {label}."),
                    _              => format!("Turn right and proceed {meters} meters to {label}."),
                };
                (turn, text)
            };

            steps.push(Instruction { direction, distance_m, text });
        }

        let last = route[route.len() - 1];
        steps.push(Instruction {
            direction:  Turn::Arrive,
            distance_m: 0.0,
            text:       format!("You have arrived at {}.", graph.label(last)),
        });

        steps
    }
}
