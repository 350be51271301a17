//! ExecutionContext — spec §3.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::conversation::{ConversationState, Message, Participant};
use super::llm_profile::ResolvedLlmConfig;
use super::trigger::Trigger;

/// The inbound event that started this run (spec §3, §6 ingress envelope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event id, used for idempotent dedup (spec §6, §8 invariant 7).
    pub id: String,
    /// The trigger kind this event maps to.
    pub event_type: Trigger,
    /// ISO-8601 timestamp of event emission.
    pub timestamp: String,
    /// Opaque event-specific payload; interpretation is trigger-dependent.
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// The immutable-from-the-rule-engine bag handed to [`crate::rule::execute`]
/// and, through it, to every [`crate::action::ActionHandler`] (spec §3).
///
/// `context` is the only rule-visible mutable store. Handlers never mutate it
/// in place; a handler returns the keys it wants changed as part of its
/// [`super::result::ActionResult`] output, and [`crate::rule::execute`]
/// collects and merges those mutations once the rule set finishes (spec §3,
/// §4.4 step 5, §8 invariant 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Tenant/organization id.
    pub org_id: String,
    /// Conversation id this run applies to.
    pub conversation_id: String,
    /// The conversation's state as of run start.
    pub conversation_state: ConversationState,
    /// The trigger that selected this run's applicable rules.
    pub trigger: Trigger,
    /// The event that caused this run.
    pub event: EventEnvelope,
    /// The triggering message, when `trigger` is message-shaped.
    pub message: Option<Message>,
    /// The acting user/participant, when known.
    pub user: Option<Participant>,
    /// Durable per-conversation key/value store, as of run start.
    ///
    /// Condition evaluation and action params may read `context.<key>`
    /// dotted paths against this map; mutations during the run are staged
    /// separately and merged in afterward (see type-level doc).
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Run-scoped metadata, not persisted with the conversation.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// The assistant's resolved LLM profile for this run.
    pub llm_config: ResolvedLlmConfig,
    /// The assistant key this run is executing under.
    pub assistant_key: String,
}

impl ExecutionContext {
    /// Read a dotted path (`context.foo.bar`, `message.content`, ...) against
    /// this execution context, returning [`Value::Null`] when the field or
    /// any intermediate segment is absent — the `undefined` outcome that
    /// `exists`/`not_exists` distinguish from a present `null` (spec §4.2,
    /// §8 invariant 6 on `undefined` fields).
    ///
    /// The root segment selects among `context`, `message`, `user`, `event`,
    /// `metadata`, `trigger`, and `conversationState`; anything else resolves
    /// to `undefined`.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let root = segments.next()?;
        let rest: Vec<&str> = segments.collect();
        let base = match root {
            "context" => Value::Object(self.context.clone()),
            "message" => self
                .message
                .as_ref()
                .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))?,
            "user" => self
                .user
                .as_ref()
                .map(|u| serde_json::to_value(u).unwrap_or(Value::Null))?,
            "event" => serde_json::to_value(&self.event).unwrap_or(Value::Null),
            "metadata" => Value::Object(self.metadata.clone()),
            "trigger" => Value::String(self.trigger.to_string()),
            "conversationState" => {
                serde_json::to_value(self.conversation_state).unwrap_or(Value::Null)
            }
            _ => return None,
        };
        rest.into_iter().try_fold(base, |acc, seg| match acc {
            Value::Object(map) => map.get(seg).cloned(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::llm_profile::{
        ContextWindowConfig, EmbeddingConfig, GenerationConfig, ObservabilityConfig,
        ProviderSelectionConfig, ReliabilityConfig, ResponseFormat, RoutingConfig,
        RoutingStrategy, SafetyConfig, TruncationStrategy,
    };

    fn llm_config() -> ResolvedLlmConfig {
        ResolvedLlmConfig {
            generation: GenerationConfig {
                temperature: 0.7,
                max_tokens: 512,
                response_format: ResponseFormat::Text,
            },
            provider: ProviderSelectionConfig {
                provider: "openai".into(),
                model: "gpt-4".into(),
                allow_fallback: false,
            },
            embedding: EmbeddingConfig {
                provider: "openai".into(),
                model: "text-embedding-3-small".into(),
                cache_embeddings: true,
            },
            routing: RoutingConfig {
                strategy: RoutingStrategy::Rules,
                similarity_threshold: 0.8,
                confidence_threshold: 0.6,
            },
            safety: SafetyConfig {
                moderation_enabled: false,
            },
            reliability: ReliabilityConfig {
                timeout_ms: 10_000,
                max_retries: 2,
                initial_backoff_ms: 200,
            },
            context: ContextWindowConfig {
                max_context_tokens: 8192,
                truncation: TruncationStrategy::SlidingWindow,
            },
            observability: ObservabilityConfig { track_usage: true },
        }
    }

    fn ctx() -> ExecutionContext {
        let mut context = Map::new();
        context.insert("lastIntent".into(), Value::String("billing".into()));
        ExecutionContext {
            org_id: "org-1".into(),
            conversation_id: "conv-1".into(),
            conversation_state: ConversationState::Idle,
            trigger: Trigger::MessageReceived,
            event: EventEnvelope {
                id: "evt-1".into(),
                event_type: Trigger::MessageReceived,
                timestamp: "2026-01-01T00:00:00Z".into(),
                data: Map::new(),
            },
            message: None,
            user: None,
            context,
            metadata: Map::new(),
            llm_config: llm_config(),
            assistant_key: "support-bot".into(),
        }
    }

    #[test]
    fn resolves_nested_context_path() {
        let c = ctx();
        assert_eq!(
            c.resolve_path("context.lastIntent"),
            Some(Value::String("billing".into()))
        );
    }

    #[test]
    fn missing_path_is_undefined() {
        let c = ctx();
        assert_eq!(c.resolve_path("context.nope"), None);
        assert_eq!(c.resolve_path("message.content"), None);
    }

    #[test]
    fn trigger_resolves_to_dotted_string() {
        let c = ctx();
        assert_eq!(
            c.resolve_path("trigger"),
            Some(Value::String("message.received".into()))
        );
    }
}
