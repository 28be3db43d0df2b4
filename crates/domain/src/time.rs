//! Timestamps.
//!
//! Timestamps are kept at millisecond precision so an entity or event
//! survives a JSON round trip unchanged.

use chrono::{DateTime, SubsecRound, Utc};

/// UTC timestamp used for `last_changed`, `last_updated` and event times.
pub type Timestamp = DateTime<Utc>;

/// The current UTC time, truncated to milliseconds.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(3)
}
