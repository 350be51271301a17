//! The [`Trigger`] enum — spec §3 "Trigger".

use serde::{Deserialize, Serialize};

/// The event that caused a rule evaluation run.
///
/// A [`crate::model::Rule`] only ever matches events of its own trigger kind
/// (spec §4.4 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A message arrived in the conversation.
    MessageReceived,
    /// A new conversation was created.
    ConversationCreated,
    /// Conversation metadata changed.
    ConversationUpdated,
    /// A handoff to a human agent was requested.
    HandoffRequested,
    /// A previously requested handoff completed.
    HandoffCompleted,
    /// The context map was updated by some other run.
    ContextUpdated,
    /// A scheduled timer fired.
    TimerElapsed,
    /// An integration- or caller-defined trigger not covered above.
    Custom,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MessageReceived => "message.received",
            Self::ConversationCreated => "conversation.created",
            Self::ConversationUpdated => "conversation.updated",
            Self::HandoffRequested => "handoff.requested",
            Self::HandoffCompleted => "handoff.completed",
            Self::ContextUpdated => "context.updated",
            Self::TimerElapsed => "timer.elapsed",
            Self::Custom => "custom",
        };
        write!(f, "{s}")
    }
}
