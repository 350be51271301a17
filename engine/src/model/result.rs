//! Action/rule/run result types — spec §3.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::conversation::ConversationState;
use super::trigger::Trigger;

/// The outcome of a single action invocation (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action completed without error.
    pub success: bool,
    /// The dispatcher key of the action that ran, e.g. `llm.invoke`.
    pub action_type: String,
    /// Handler-specific output payload, when successful.
    pub output: Option<Value>,
    /// A human-readable error message, when `success` is `false`.
    pub error: Option<String>,
    /// Wall-clock time spent inside the handler, in milliseconds.
    pub duration_ms: u64,
}

impl ActionResult {
    /// Build a success result.
    #[must_use]
    pub fn ok(action_type: impl Into<String>, output: Option<Value>, duration_ms: u64) -> Self {
        Self {
            success: true,
            action_type: action_type.into(),
            output,
            error: None,
            duration_ms,
        }
    }

    /// Build a failure result.
    #[must_use]
    pub fn failed(action_type: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            action_type: action_type.into(),
            output: None,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// The outcome of evaluating and, if matched, executing one rule
/// (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleExecutionResult {
    /// The rule's id.
    pub rule_id: String,
    /// The rule's name, for human-facing logs/audits.
    pub rule_name: String,
    /// Whether the rule's condition tree matched.
    pub matched: bool,
    /// Number of leaf conditions actually evaluated before short-circuiting
    /// (spec §8 invariant 1).
    pub conditions_evaluated: u32,
    /// Results of each action run, in order. Empty when `matched` is
    /// `false`.
    pub actions_executed: Vec<ActionResult>,
    /// Set when a non-[`crate::error::TokenAuthError`] error aborted this
    /// rule's action sequence (spec §4.4 step 4, §7).
    pub error: Option<String>,
    /// Wall-clock time spent evaluating and, if matched, executing this
    /// rule.
    pub duration_ms: u64,
}

/// The outcome of one full run through [`crate::rule::execute`]
/// (spec §3, §4.4, §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Unique id for this run, for tracing/audit correlation.
    pub run_id: String,
    /// Tenant/organization id.
    pub org_id: String,
    /// Conversation id this run applied to.
    pub conversation_id: String,
    /// The trigger that selected this run's rule set.
    pub trigger: Trigger,
    /// Total rules considered (post trigger/enabled filter).
    pub rules_evaluated: u32,
    /// Rules whose condition tree matched.
    pub rules_matched: u32,
    /// Per-rule results, in evaluation order.
    pub results: Vec<RuleExecutionResult>,
    /// The conversation's new state, if any rule performed a
    /// `state.transition` (spec §4.4 step 5).
    pub new_state: Option<ConversationState>,
    /// Total wall-clock time for the run.
    pub duration_ms: u64,
    /// ISO-8601 timestamp the run completed at.
    pub timestamp: String,
}

impl RunResult {
    /// Whether first-match-wins stopped after the first matched rule
    /// (spec §4.4 step 3, §9 Open Question 1): true when fewer rules were
    /// evaluated than were available, because a match short-circuited the
    /// rest — callers with the full candidate count can use this to assert
    /// invariant-3-style behavior in tests.
    #[must_use]
    pub const fn stopped_early(&self, candidates: u32) -> bool {
        self.rules_evaluated < candidates
    }
}
