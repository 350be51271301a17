//! Common utility functions and types.
//!
//! This module provides shared utilities used across the crate to avoid code duplication.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Environment variable the agent credential is read from (spec §6:
/// "Credentials always loaded from environment, never from source").
pub const DEFAULT_AGENT_CREDENTIAL_ENV: &str = "ASSISTANTS_GATEWAY_AGENT_CREDENTIAL";

/// Get current timestamp in milliseconds since Unix epoch.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn timestamp_ms() -> u64 {
    // Truncation is safe: timestamp won't overflow u64 for ~500 million years
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ms() {
        let ts = timestamp_ms();
        assert!(ts > 0);
        // Should be after 2020-01-01
        assert!(ts > 1_577_836_800_000);
    }
}
