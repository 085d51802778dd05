//! Outbound delivery.

use parking_lot::Mutex;

use evac_core::SessionId;

use crate::event::Outbound;

/// The real-time transport, as seen by the engine.
///
/// Both methods are fire-and-forget: a session that vanished between the
/// decision to notify and the delivery is the transport's problem.
pub trait Notifier: Send + Sync {
    /// Deliver `event` to one session.
    fn send(&self, to: &SessionId, event: &Outbound);

    /// Deliver `event` to every connected session except `except`.
    fn broadcast(&self, event: &Outbound, except: Option<&SessionId>);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, _to: &SessionId, _event: &Outbound) {}
    fn broadcast(&self, _event: &Outbound, _except: Option<&SessionId>) {}
}

// ── RecordingNotifier ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    Session(SessionId),
    Broadcast { except: Option<SessionId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to:    Recipient,
    pub event: Outbound,
}

/// Keeps every delivery in order, for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    log: Mutex<Vec<Delivery>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.lock().clone()
    }

    /// Events sent directly to `session`, in order.
    pub fn sent_to(&self, session: &SessionId) -> Vec<Outbound> {
        self.log
            .lock()
            .iter()
            .filter(|d| matches!(&d.to, Recipient::Session(s) if s == session))
            .map(|d| d.event.clone())
            .collect()
    }

    /// Broadcast events, in order.
    pub fn broadcasts(&self) -> Vec<Outbound> {
        self.log
            .lock()
            .iter()
            .filter(|d| matches!(d.to, Recipient::Broadcast { .. }))
            .map(|d| d.event.clone())
            .collect()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.log.lock())
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, to: &SessionId, event: &Outbound) {
        self.log.lock().push(Delivery {
            to:    Recipient::Session(to.clone()),
            event: event.clone(),
        });
    }

    fn broadcast(&self, event: &Outbound, except: Option<&SessionId>) {
        self.log.lock().push(Delivery {
            to:    Recipient::Broadcast { except: except.cloned() },
            event: event.clone(),
        });
    }
}
