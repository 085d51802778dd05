//! Optional durable copy of registry state.
//!
//! The mirror is strictly write-through: nothing ever reads it back to make
//! a routing decision, and a failing mirror only produces a `warn` log line.
//!
//! # Keys
//!
//! | Record      | Key                       |
//! |-------------|---------------------------|
//! | occupant    | `occupant:<session id>`   |
//! | obstruction | `obstruction:<waypoint>`  |
//!
//! Values are JSON documents chosen by the caller.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use evac_core::SessionId;

use crate::{RegistryError, RegistryResult};

pub fn occupant_key(session: &SessionId) -> String {
    format!("occupant:{session}")
}

pub fn obstruction_key(waypoint: &str) -> String {
    format!("obstruction:{waypoint}")
}

// ── StateMirror trait ─────────────────────────────────────────────────────────

/// A key/value sink receiving a copy of every registry change.
pub trait StateMirror: Send + Sync {
    fn put(&self, key: &str, value: &str) -> RegistryResult<()>;

    fn delete(&self, key: &str) -> RegistryResult<()>;

    fn name(&self) -> &'static str;
}

/// Serialize `value` and store it under `key`, logging instead of failing.
pub fn put_json<T: Serialize + ?Sized>(mirror: &dyn StateMirror, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(RegistryError::from)
        .and_then(|json| mirror.put(key, &json));
    if let Err(e) = result {
        warn!(mirror = mirror.name(), key, error = %e, "mirror_put_failed");
    }
}

/// Delete `key`, logging instead of failing.
pub fn delete_logged(mirror: &dyn StateMirror, key: &str) {
    if let Err(e) = mirror.delete(key) {
        warn!(mirror = mirror.name(), key, error = %e, "mirror_delete_failed");
    }
}

// ── NoopMirror ────────────────────────────────────────────────────────────────

/// Discards everything.  The default when no mirror is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMirror;

impl StateMirror for NoopMirror {
    fn put(&self, _key: &str, _value: &str) -> RegistryResult<()> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> RegistryResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

// ── MemoryMirror ──────────────────────────────────────────────────────────────

/// Keeps the mirrored documents in a map.  Handy in tests.
#[derive(Debug, Default)]
pub struct MemoryMirror {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StateMirror for MemoryMirror {
    fn put(&self, key: &str, value: &str) -> RegistryResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> RegistryResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
