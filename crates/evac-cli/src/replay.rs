//! Session-script replay.
//!
//! A script is JSON lines, one step each:
//!
//! ```text
//! {"session": "a", "event": "connect"}
//! {"session": "a", "event": "join", "name": "Ana", "startWaypoint": "p129"}
//! {"session": "b", "event": "report_blockage", "message": "fire at h8"}
//! {"session": "a", "event": "disconnect"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.  A line that does
//! not parse stops the replay; a step the service rejects does not (the
//! session already got its `error` event).

use std::io::BufRead;

use anyhow::{Context, anyhow};
use serde_json::Value;
use tracing::{debug, info};

use evac_core::SessionId;
use evac_coord::{EvacService, Inbound};
use evac_spatial::Router;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Connect,
    Disconnect,
    Event(Inbound),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub session: SessionId,
    pub step:    Step,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps:    usize,
    pub rejected: usize,
}

/// Parse one script line.
pub fn parse_line(line: &str) -> anyhow::Result<ScriptLine> {
    let mut value: Value = serde_json::from_str(line)?;
    let object = value.as_object_mut().ok_or_else(|| anyhow!("expected a JSON object"))?;

    let session = match object.remove("session") {
        Some(Value::String(s)) => SessionId::new(s),
        _ => return Err(anyhow!("missing string field \"session\"")),
    };

    let event = object.get("event").and_then(Value::as_str).map(str::to_owned);
    let step = match event.as_deref() {
        Some("connect")    => Step::Connect,
        Some("disconnect") => Step::Disconnect,
        Some(_)            => Step::Event(serde_json::from_value(value)?),
        None               => return Err(anyhow!("missing string field \"event\"")),
    };
    Ok(ScriptLine { session, step })
}

/// Feed every step of `script` through `service`.
pub fn replay<R: Router, B: BufRead>(service: &EvacService<R>, script: B) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in script.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("failed to read script line {number}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let ScriptLine { session, step } =
            parse_line(line).with_context(|| format!("bad script line {number}"))?;
        summary.steps += 1;

        match step {
            Step::Connect    => service.connect(&session),
            Step::Disconnect => service.disconnect(&session),
            Step::Event(event) => {
                if let Err(e) = service.handle(&session, event) {
                    debug!(line = number, error = %e, "step_rejected");
                    summary.rejected += 1;
                }
            }
        }
    }

    info!(steps = summary.steps, rejected = summary.rejected, "replay_finished");
    Ok(summary)
}
