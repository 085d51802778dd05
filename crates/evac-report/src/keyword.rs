//! Deterministic keyword rules.
//!
//! | Keywords (substring, case-insensitive)    | Severity | Category   |
//! |-------------------------------------------|----------|------------|
//! | `fire`, `smoke`                           | CRITICAL | FIRE       |
//! | `explosion`, `collapse`, `structural`     | CRITICAL | STRUCTURAL |
//! | `blocked`, `debris`, `obstacle`, `fallen` | HIGH     | DEBRIS     |
//! | `crowd`, `congested`, `slow`, `packed`    | MEDIUM   | CROWD      |
//! | anything else                             | HIGH     | OTHER      |
//!
//! Rows are checked top to bottom; the first match wins.
//!
//! The location is the first word shaped like a waypoint reference:
//! `p<digits>` (a key), `h<digits>` (a hallway label), or a 3–4 digit room
//! number with an optional letter suffix.  Without one, the reporter's own
//! waypoint is used.

use evac_core::{Category, Severity};

use crate::interpreter::{Interpretation, ReportInterpreter};
use crate::ReportResult;

const FIRE:       &[&str] = &["fire", "smoke"];
const STRUCTURAL: &[&str] = &["explosion", "collapse", "structural"];
const DEBRIS:     &[&str] = &["blocked", "debris", "obstacle", "fallen"];
const CROWD:      &[&str] = &["crowd", "congested", "slow", "packed"];

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordInterpreter;

impl KeywordInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Severity and category from keywords alone.
    pub fn classify(&self, message: &str) -> (Severity, Category) {
        let lower = message.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if any(FIRE) {
            (Severity::Critical, Category::Fire)
        } else if any(STRUCTURAL) {
            (Severity::Critical, Category::Structural)
        } else if any(DEBRIS) {
            (Severity::High, Category::Debris)
        } else if any(CROWD) {
            (Severity::Medium, Category::Crowd)
        } else {
            (Severity::High, Category::Other)
        }
    }

    /// First waypoint-shaped word in `message`, lower-cased.
    pub fn extract_location(&self, message: &str) -> Option<String> {
        message
            .split(|c: char| !c.is_ascii_alphanumeric())
            .find(|w| is_location_token(w))
            .map(str::to_ascii_lowercase)
    }
}

impl ReportInterpreter for KeywordInterpreter {
    fn interpret(&self, message: &str, reporter: Option<&str>) -> ReportResult<Interpretation> {
        let (severity, category) = self.classify(message);
        let location = self
            .extract_location(message)
            .or_else(|| reporter.map(str::to_string));
        Ok(Interpretation::new(location, severity, category))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

fn is_location_token(word: &str) -> bool {
    let bytes = word.as_bytes();
    if let [b'p' | b'P' | b'h' | b'H', rest @ ..] = bytes {
        return !rest.is_empty() && rest.iter().all(u8::is_ascii_digit);
    }
    // Room numbers may carry one letter suffix ("1063a").
    let digits = match bytes.split_last() {
        Some((last, init)) if last.is_ascii_alphabetic() => init,
        _ => bytes,
    };
    (3..=4).contains(&digits.len()) && digits.iter().all(u8::is_ascii_digit)
}
