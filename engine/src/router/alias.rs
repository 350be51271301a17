//! Alias normalization (spec §4.6 "Normalization").

use std::collections::HashMap;

/// Maps short aliases (as typed by a user, e.g. `@logs`) to canonical
/// assistant keys. The fixed entries below are *defaults*, not contract
/// (spec §9 Open Question 3) — callers may replace or extend this map from
/// configuration.
#[derive(Debug, Clone)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl Default for AliasMap {
    fn default() -> Self {
        let entries = [
            ("logs", "log-analyst"),
            ("catalog", "catalog-search"),
            ("debug", "run-debugger"),
            ("help", "coordinator"),
            ("build", "assistants-assistant"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { entries }
    }
}

impl AliasMap {
    /// Build an alias map from explicit entries, bypassing the defaults.
    #[must_use]
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Strip a leading `@`, lower-case, then look up the alias map; an
    /// unmapped lowercased name is its own canonical key (spec §4.6: "always
    /// a total key-lowercasing lookup").
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let stripped = raw.strip_prefix('@').unwrap_or(raw);
        let lowered = stripped.to_lowercase();
        self.entries.get(lowered.as_str()).cloned().unwrap_or(lowered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_at_and_lowercases() {
        let map = AliasMap::default();
        assert_eq!(map.normalize("@Logs"), "log-analyst");
        assert_eq!(map.normalize("LOGS"), "log-analyst");
    }

    #[test]
    fn unmapped_name_passes_through_lowercased() {
        let map = AliasMap::default();
        assert_eq!(map.normalize("@Some-Other-Bot"), "some-other-bot");
    }
}
