//! ActionConfig — spec §3.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One configured action within a rule's action list (spec §3).
///
/// `params` is intentionally untyped JSON at this layer — spec §9's design
/// note calls for "strongly typed at the boundary, kept general inside the
/// dispatcher": each handler parses its own typed params struct out of this
/// map and reports a [`crate::error::ActionError::Validation`] on mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// The dispatcher key, e.g. `llm.invoke`, `message.send`, `assistant.route`.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Opaque handler-specific parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ActionConfig {
    /// Construct an action config from a type and params value.
    #[must_use]
    pub fn new(action_type: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            action_type: action_type.into(),
            params,
        }
    }
}
