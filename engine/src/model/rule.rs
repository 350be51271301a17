//! Rule and RuleSet — spec §3.

use serde::{Deserialize, Serialize};

use super::action::ActionConfig;
use super::condition::ConditionGroup;
use super::trigger::Trigger;

/// A single rule: a trigger filter, a condition tree, and an ordered list of
/// actions to run when it matches (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique (within its rule set) rule id.
    pub id: String,
    /// Human-readable name, surfaced on [`crate::model::RuleExecutionResult`].
    pub name: String,
    /// Higher priority wins; ties break by original declaration order
    /// (spec §4.4 step 2, spec §8 invariant 2).
    pub priority: i64,
    /// A disabled rule is never evaluated (spec §3 invariant).
    pub enabled: bool,
    /// The trigger kind this rule responds to.
    pub trigger: Trigger,
    /// The condition tree gating this rule.
    pub conditions: ConditionGroup,
    /// Actions executed, in order, when `conditions` evaluates true.
    pub actions: Vec<ActionConfig>,
}

/// An ordered collection of rules owned by one assistant, keyed by org
/// (spec §3, §4.5).
///
/// Keys follow `<assistant-key>:<org-id>`, with `<assistant-key>:default` as
/// the fallback when no org-specific set exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// The `<assistant-key>:<org-id>` (or `:default`) key this set is stored
    /// under.
    pub key: String,
    /// Monotonically increasing version; a rule set edit produces a new
    /// version (spec §3 "Lifecycle").
    pub version: u64,
    /// The rules themselves. Rule-id uniqueness within a set is an invariant
    /// enforced by [`RuleSet::validate`], not by this type alone.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Construct an empty rule set.
    #[must_use]
    pub const fn new(key: String, version: u64) -> Self {
        Self {
            key,
            version,
            rules: Vec::new(),
        }
    }

    /// Validate the rule-id-uniqueness invariant from spec §3.
    ///
    /// # Errors
    ///
    /// Returns the first duplicated rule id encountered.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(format!("duplicate rule id '{}' in rule set '{}'", rule.id, self.key));
            }
        }
        Ok(())
    }

    /// Rules matching `trigger`, enabled, stable-sorted by priority
    /// descending with ties broken by original declaration order
    /// (spec §4.4 steps 1–2).
    #[must_use]
    pub fn applicable(&self, trigger: Trigger) -> Vec<&Rule> {
        let mut applicable: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| r.enabled && r.trigger == trigger)
            .collect();
        // `sort_by` is stable, so equal-priority rules keep their original
        // relative order — this is the declaration-order tie-break.
        applicable.sort_by(|a, b| b.priority.cmp(&a.priority));
        applicable
    }

    /// Build the assistant-scoped key `<assistant-key>:<org-id>`.
    #[must_use]
    pub fn key_for(assistant_key: &str, org_id: &str) -> String {
        format!("{assistant_key}:{org_id}")
    }

    /// Build the default fallback key `<assistant-key>:default`.
    #[must_use]
    pub fn default_key_for(assistant_key: &str) -> String {
        format!("{assistant_key}:default")
    }
}
