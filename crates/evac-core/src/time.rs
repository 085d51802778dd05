//! Wall-clock timestamps.
//!
//! Sessions are live, so time is plain UTC wall time rather than a
//! simulation tick.  Every registry record and outbound event carries one.

use chrono::{DateTime, Utc};

/// UTC wall-clock instant, serialized as RFC 3339.
pub type Timestamp = DateTime<Utc>;

/// Current UTC time.
#[inline]
pub fn now() -> Timestamp {
    Utc::now()
}
