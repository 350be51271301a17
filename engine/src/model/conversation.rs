//! Conversation state, participation, and message envelope — spec §3.

use serde::{Deserialize, Serialize};

/// One of the seven states a conversation can be in.
///
/// Initial state is always [`ConversationState::Idle`]; [`ConversationState::Resolved`]
/// and [`ConversationState::Archived`] are terminal. Transitions only happen
/// via a successful `state.transition` action (spec §3, §4.6's state machine
/// diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// No assistant is actively engaged.
    Idle,
    /// An assistant is actively generating/responding.
    AiActive,
    /// Waiting on the user to respond.
    WaitingForUser,
    /// A handoff to a human agent has been requested but not assigned.
    HandoffPending,
    /// A human agent is actively engaged.
    AgentActive,
    /// Terminal: the conversation is resolved.
    Resolved,
    /// Terminal: the conversation is archived.
    Archived,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::Idle
    }
}

impl ConversationState {
    /// Terminal states never legally transition further.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Archived)
    }

    /// Whether `self -> target` is a legal transition per the state machine
    /// in spec §4.6. `archive` is reachable from any non-terminal state;
    /// all other edges are as drawn in the diagram.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use ConversationState::{
            AgentActive, AiActive, Archived, HandoffPending, Idle, Resolved, WaitingForUser,
        };
        if self.is_terminal() {
            return false;
        }
        match target {
            Archived => true,
            AiActive => matches!(self, Idle | AiActive),
            WaitingForUser => matches!(self, Idle),
            HandoffPending => matches!(self, AiActive),
            AgentActive => matches!(self, HandoffPending),
            Resolved => matches!(self, AgentActive),
            Idle => false,
        }
    }
}

/// `user` or `agent` — who a participant represents (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// A human end user.
    User,
    /// An assistant or human agent acting as a service principal.
    Agent,
}

/// A participant's role within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// The conversation's creator/owner.
    Owner,
    /// An administrator of the conversation.
    Admin,
    /// An ordinary member.
    Member,
}

/// One entry in a conversation's ordered participant set (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// The principal id, e.g. a user id or `assistant:<alias>`.
    pub user_id: String,
    /// Whether this participant is a user or an agent/assistant.
    pub user_type: UserType,
    /// The participant's role.
    pub role: ParticipantRole,
    /// The message-layer identity used for addressing, if distinct from
    /// `user_id`.
    pub entity_id: Option<String>,
}

/// Message priority, carried through to the Messaging collaborator on send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Lowest priority.
    Low,
    /// Default priority.
    Normal,
    /// Above normal.
    High,
    /// Should preempt in-flight lower-priority sends.
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

/// A message within a conversation (spec §3, §6 ingress envelope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id; used for idempotent dedup (spec §6).
    pub id: String,
    /// Id of the sender (a user id or `assistant:<alias>`).
    pub sender_id: String,
    /// Whether the sender is a user or an agent.
    pub sender_type: UserType,
    /// Raw message content.
    pub content: String,
    /// MIME-ish content type hint (defaults to `text/plain` when absent).
    pub content_type: Option<String>,
    /// Opaque per-message metadata (e.g. `routedFrom`, `routeReason`).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
    /// Monotonic per-conversation sequence number.
    #[serde(default)]
    pub sequence: Option<u64>,
    /// Delivery priority.
    #[serde(default)]
    pub priority: Priority,
    /// Whether a higher-priority message may preempt this one before
    /// delivery completes.
    #[serde(default)]
    pub interruptible: bool,
    /// Set when this message was preempted by another message's id.
    #[serde(default)]
    pub preempted_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConversationState::{AgentActive, AiActive, Archived, HandoffPending, Idle, Resolved, WaitingForUser};

    #[test]
    fn legal_transitions_from_idle() {
        assert!(Idle.can_transition_to(AiActive));
        assert!(Idle.can_transition_to(WaitingForUser));
        assert!(Idle.can_transition_to(Archived));
        assert!(!Idle.can_transition_to(AgentActive));
        assert!(!Idle.can_transition_to(Resolved));
    }

    #[test]
    fn handoff_flow() {
        assert!(AiActive.can_transition_to(HandoffPending));
        assert!(HandoffPending.can_transition_to(AgentActive));
        assert!(AgentActive.can_transition_to(Resolved));
        assert!(!HandoffPending.can_transition_to(Resolved));
    }

    #[test]
    fn undrawn_edges_are_illegal() {
        assert!(!AiActive.can_transition_to(WaitingForUser));
        assert!(!WaitingForUser.can_transition_to(HandoffPending));
    }

    #[test]
    fn terminal_states_reject_everything_but_are_final() {
        assert!(Resolved.is_terminal());
        assert!(Archived.is_terminal());
        assert!(!Resolved.can_transition_to(Archived));
        assert!(!Resolved.can_transition_to(Idle));
    }
}
