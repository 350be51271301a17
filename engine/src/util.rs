//! Small shared helpers: id generation and timestamps.
//!
//! Kept separate from `model` so the rest of the crate can depend on it
//! without pulling in the full data model.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Current time as an ISO-8601 / RFC 3339 timestamp (spec §6 ingress/egress
/// event shapes use this format throughout).
#[must_use]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Current time as a [`DateTime<Utc>`].
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique, sortable id with the given prefix (e.g. `run`, `evt`).
///
/// Combines a UUIDv4 with a process-local monotonic counter so ids stay
/// unique even when the clock has not advanced between calls.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{}_{counter:x}", uuid::Uuid::new_v4().simple())
}

/// Generate a unique run id.
#[must_use]
pub fn generate_run_id() -> String {
    generate_id("run")
}

/// Generate a unique event id.
#[must_use]
pub fn generate_event_id() -> String {
    generate_id("evt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert_ne!(a, b);
        assert!(a.starts_with("run_"));
    }

    #[test]
    fn timestamp_parses_back() {
        let ts = now_iso8601();
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
