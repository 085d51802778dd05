//! Report interpretation through an external language client.
//!
//! The client is asked for a bare JSON object:
//!
//! ```json
//! { "location": "h4", "severity": "CRITICAL", "type": "FIRE" }
//! ```
//!
//! Answers wrapped in a fenced code block are accepted.  Any client or
//! parse failure falls back to [`KeywordInterpreter`], so this interpreter
//! never fails.

use serde::Deserialize;
use tracing::{debug, warn};

use evac_core::{Category, Severity};

use crate::interpreter::{Interpretation, ReportInterpreter};
use crate::keyword::KeywordInterpreter;
use crate::{ReportError, ReportResult};

/// A text-completion backend.  Transport and model choice live entirely
/// behind this trait.
pub trait LanguageClient: Send + Sync {
    fn complete(&self, prompt: &str) -> ReportResult<String>;
}

#[derive(Deserialize)]
struct Answer {
    #[serde(default)]
    location: Option<String>,
    severity: Severity,
    #[serde(rename = "type")]
    category: Category,
}

/// [`ReportInterpreter`] backed by a [`LanguageClient`], with keyword
/// fallback.
pub struct AssistedInterpreter<C: LanguageClient> {
    client:   C,
    fallback: KeywordInterpreter,
}

impl<C: LanguageClient> AssistedInterpreter<C> {
    pub fn new(client: C) -> Self {
        Self { client, fallback: KeywordInterpreter }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn ask(&self, message: &str, reporter: Option<&str>) -> ReportResult<Interpretation> {
        let reply = self.client.complete(&build_prompt(message, reporter))?;
        let answer: Answer = serde_json::from_str(strip_fences(&reply))
            .map_err(|e| ReportError::Parse(e.to_string()))?;
        let location = answer
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("null"));
        Ok(Interpretation::new(location, answer.severity, answer.category))
    }
}

impl<C: LanguageClient> ReportInterpreter for AssistedInterpreter<C> {
    fn interpret(&self, message: &str, reporter: Option<&str>) -> ReportResult<Interpretation> {
        match self.ask(message, reporter) {
            Ok(found) => {
                debug!(location = ?found.location, severity = %found.severity, "report_interpreted");
                Ok(found)
            }
            Err(e) => {
                warn!(error = %e, "interpreter_fallback");
                self.fallback.interpret(message, reporter)
            }
        }
    }

    fn name(&self) -> &'static str {
        "assisted"
    }
}

fn build_prompt(message: &str, reporter: Option<&str>) -> String {
    let position = reporter.unwrap_or("unknown");
    format!(
        "An occupant standing at waypoint \"{position}\" reported a hazard during a building evacuation:\n\
         \"{message}\"\n\
         \n\
         Reply with one JSON object and nothing else:\n\
         {{\"location\": <waypoint id, hallway label or room number, or null>, \
         \"severity\": \"LOW\"|\"MEDIUM\"|\"HIGH\"|\"CRITICAL\", \
         \"type\": \"FIRE\"|\"DEBRIS\"|\"CROWD\"|\"STRUCTURAL\"|\"OTHER\"}}\n\
         \n\
         If the report says \"here\" or \"this hallway\", the location is \"{position}\".\n\
         Fire, smoke, explosions and collapse are CRITICAL. Debris or a blocked path is HIGH. \
         Crowding is MEDIUM."
    )
}

/// Body of the first fenced block in `reply`, or the whole reply trimmed.
pub(crate) fn strip_fences(reply: &str) -> &str {
    let text = reply.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let body = &text[open + 3..];
    // Skip an info string such as `json`.
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}
