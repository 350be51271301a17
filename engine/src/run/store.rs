//! Conversation state/context/run-log persistence (spec §4.5, §9 Open
//! Question — persistence interface).
//!
//! Messaging owns durable conversation storage; this engine only needs a
//! narrow slice of it (state, context map, run log) to drive rule
//! evaluation. [`ConversationStore`] is that slice, kept deliberately small
//! so a real deployment can back it with whatever Messaging exposes, while
//! [`InMemoryConversationStore`] is enough to run the engine standalone and
//! in tests.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::{ConversationState, RunResult};

/// Durable per-conversation state the run coordinator reads and writes
/// (spec §4.5 contract: "load conversation state... load... context map...
/// persist state... persist... append `result` to the run log").
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Current conversation state, defaulting to [`ConversationState::Idle`]
    /// for a conversation never seen before (spec §4.5 step 2).
    async fn load_state(&self, conversation_id: &str) -> Result<ConversationState>;

    /// Current context map, defaulting to empty.
    async fn load_context(&self, conversation_id: &str) -> Result<Map<String, Value>>;

    /// Persist a new conversation state (spec §4.5 step 4: "if
    /// `result.newState` is present, persist state").
    async fn persist_state(&self, conversation_id: &str, state: ConversationState) -> Result<()>;

    /// Persist the merged context map (spec §4.5 step 5).
    async fn persist_context(&self, conversation_id: &str, context: Map<String, Value>) -> Result<()>;

    /// Append one run's result to the conversation's run log (spec §4.5
    /// step 6).
    async fn append_run(&self, conversation_id: &str, result: RunResult) -> Result<()>;
}

#[derive(Default)]
struct ConversationRecord {
    state: ConversationState,
    context: Map<String, Value>,
    run_log: Vec<RunResult>,
}

/// In-memory [`ConversationStore`], keyed by conversation id. Sufficient for
/// a standalone deployment and for tests; `gateway` may swap in a
/// Messaging-backed implementation without changing the coordinator.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: DashMap<String, ConversationRecord>,
}

impl InMemoryConversationStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs recorded for `conversation_id`, for tests.
    #[must_use]
    pub fn run_log_len(&self, conversation_id: &str) -> usize {
        self.conversations.get(conversation_id).map_or(0, |r| r.run_log.len())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load_state(&self, conversation_id: &str) -> Result<ConversationState> {
        Ok(self.conversations.get(conversation_id).map_or(ConversationState::Idle, |r| r.state))
    }

    async fn load_context(&self, conversation_id: &str) -> Result<Map<String, Value>> {
        Ok(self.conversations.get(conversation_id).map_or_else(Map::new, |r| r.context.clone()))
    }

    async fn persist_state(&self, conversation_id: &str, state: ConversationState) -> Result<()> {
        self.conversations.entry(conversation_id.to_string()).or_default().state = state;
        Ok(())
    }

    async fn persist_context(&self, conversation_id: &str, context: Map<String, Value>) -> Result<()> {
        self.conversations.entry(conversation_id.to_string()).or_default().context = context;
        Ok(())
    }

    async fn append_run(&self, conversation_id: &str, result: RunResult) -> Result<()> {
        self.conversations.entry(conversation_id.to_string()).or_default().run_log.push(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unseen_conversation_defaults_to_idle_and_empty() {
        let store = InMemoryConversationStore::new();
        assert_eq!(store.load_state("conv-1").await.unwrap(), ConversationState::Idle);
        assert!(store.load_context("conv-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persisted_state_and_context_round_trip() {
        let store = InMemoryConversationStore::new();
        store.persist_state("conv-1", ConversationState::AiActive).await.unwrap();
        let mut context = Map::new();
        context.insert("lastIntent".into(), Value::String("billing".into()));
        store.persist_context("conv-1", context.clone()).await.unwrap();

        assert_eq!(store.load_state("conv-1").await.unwrap(), ConversationState::AiActive);
        assert_eq!(store.load_context("conv-1").await.unwrap(), context);
    }
}
