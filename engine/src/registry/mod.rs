//! Copy-on-write rule set registry (spec §5 "Rule set cache").
//!
//! Read-mostly; readers never lock. [`dashmap`] gives us fine-grained
//! sharded locking for the rare write path (a rule set reload), while reads
//! clone an `Arc` out and release the shard lock immediately — no reader
//! blocks on another reader.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::RuleSet;

/// Holds every loaded rule set, keyed by `<assistant-key>:<org-id>` or
/// `<assistant-key>:default` (spec §3, §4.5).
#[derive(Default)]
pub struct RuleSetRegistry {
    sets: DashMap<String, Arc<RuleSet>>,
}

impl RuleSetRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace a rule set under its own key. A background reload
    /// calls this; the atomic `Arc` swap means in-flight readers keep using
    /// the version they already cloned out (spec §9 "wrap in a copy-on-write
    /// holder with atomic pointer swap").
    pub fn put(&self, rule_set: RuleSet) {
        self.sets.insert(rule_set.key.clone(), Arc::new(rule_set));
    }

    /// Fetch the rule set for `assistant_key`/`org_id`, falling back to
    /// `<assistant_key>:default` when no org-specific set is loaded
    /// (spec §4.5 contract step 1).
    #[must_use]
    pub fn resolve(&self, assistant_key: &str, org_id: &str) -> Option<Arc<RuleSet>> {
        let scoped = RuleSet::key_for(assistant_key, org_id);
        self.sets
            .get(&scoped)
            .map(|entry| Arc::clone(entry.value()))
            .or_else(|| {
                let default_key = RuleSet::default_key_for(assistant_key);
                self.sets.get(&default_key).map(|entry| Arc::clone(entry.value()))
            })
    }

    /// Whether any rule set (scoped or default) is loaded for `assistant_key`
    /// — used by the router to decide whether a routing target even has a
    /// live engine behind it (spec §4.6 step 1).
    #[must_use]
    pub fn has_assistant(&self, assistant_key: &str) -> bool {
        self.sets.contains_key(&RuleSet::default_key_for(assistant_key))
            || self.sets.iter().any(|entry| entry.value().key.starts_with(&format!("{assistant_key}:")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_when_org_scoped_missing() {
        let registry = RuleSetRegistry::new();
        registry.put(RuleSet::new(RuleSet::default_key_for("support-bot"), 1));
        let resolved = registry.resolve("support-bot", "org-9").expect("default fallback");
        assert_eq!(resolved.key, "support-bot:default");
    }

    #[test]
    fn prefers_org_scoped_over_default() {
        let registry = RuleSetRegistry::new();
        registry.put(RuleSet::new(RuleSet::default_key_for("support-bot"), 1));
        registry.put(RuleSet::new(RuleSet::key_for("support-bot", "org-9"), 2));
        let resolved = registry.resolve("support-bot", "org-9").expect("org scoped");
        assert_eq!(resolved.key, "support-bot:org-9");
    }

    #[test]
    fn missing_assistant_resolves_to_none() {
        let registry = RuleSetRegistry::new();
        assert!(registry.resolve("nope", "org-1").is_none());
    }
}
