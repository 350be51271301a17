//! Condition and ConditionGroup — spec §3.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A comparison operator usable in a [`Condition`] (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Greater than (numeric).
    Gt,
    /// Greater than or equal (numeric).
    Gte,
    /// Less than (numeric).
    Lt,
    /// Less than or equal (numeric).
    Lte,
    /// String/array contains.
    Contains,
    /// String/array does not contain.
    NotContains,
    /// String starts with.
    StartsWith,
    /// String ends with.
    EndsWith,
    /// Regular expression match.
    Matches,
    /// Regular expression does not match.
    NotMatches,
    /// Value is a member of a list.
    In,
    /// Value is not a member of a list.
    NotIn,
    /// Field resolves to something other than `undefined`.
    Exists,
    /// Field resolves to `undefined`.
    NotExists,
}

/// A single leaf test: `field <operator> value` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path resolved against the execution context, e.g.
    /// `message.content` or `context.lastIntent`.
    pub field: String,
    /// The comparison to apply.
    pub operator: Operator,
    /// The comparison operand. Absent/`Value::Null` is valid for
    /// `exists`/`not_exists`, which ignore it.
    #[serde(default)]
    pub value: Value,
}

/// How child conditions of a [`ConditionGroup`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logic {
    /// All children must hold; short-circuits on the first `false`.
    And,
    /// Any child may hold; short-circuits on the first `true`.
    Or,
}

/// A node in the condition tree: either a single [`Condition`] or a nested
/// [`ConditionGroup`]. Recursive with arbitrary depth (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    /// A leaf comparison.
    Leaf(Condition),
    /// A nested AND/OR group.
    Group(ConditionGroup),
}

/// A group of conditions combined by AND/OR logic, recursive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    /// Combination logic for this group's children.
    pub logic: Logic,
    /// Child leaves or nested groups.
    pub conditions: Vec<ConditionNode>,
}

impl ConditionGroup {
    /// Build an empty group with the given logic. An empty `and` group
    /// evaluates to `true` (vacuous truth); an empty `or` group evaluates to
    /// `false`.
    #[must_use]
    pub const fn new(logic: Logic) -> Self {
        Self {
            logic,
            conditions: Vec::new(),
        }
    }
}
