//! JSON-lines transport for replay.

use std::io::Write;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use evac_coord::{Notifier, Outbound};
use evac_core::SessionId;

#[derive(Serialize)]
struct Line<'a> {
    /// Recipient session, or `"*"` for a broadcast.
    to:     &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    except: Option<&'a SessionId>,
    #[serde(flatten)]
    event:  &'a Outbound,
}

/// Writes every outbound event as one JSON object per line.
pub struct JsonLinesNotifier<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write(&self, line: &Line<'_>) {
        let mut out = self.out.lock();
        let result = serde_json::to_writer(&mut *out, line)
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush());
        if let Err(e) = result {
            warn!(event = line.event.kind(), error = %e, "output_write_failed");
        }
    }
}

impl<W: Write + Send> Notifier for JsonLinesNotifier<W> {
    fn send(&self, to: &SessionId, event: &Outbound) {
        self.write(&Line { to: to.as_str(), except: None, event });
    }

    fn broadcast(&self, event: &Outbound, except: Option<&SessionId>) {
        self.write(&Line { to: "*", except, event });
    }
}
