//! C5 — Run Coordinator (spec §4.5).
//!
//! `process_event(event) -> RunResult`: resolves the rule set and
//! conversation state, drives [`crate::rule::execute`], persists its effects,
//! and owns the token-auth retry-once policy (spec §8 invariant 10) and
//! per-conversation serialization (spec §5) that the rule executor itself
//! does not.

pub mod mailbox;
pub mod store;

pub use mailbox::{Mailbox, DEFAULT_MAILBOX_DEPTH};
pub use store::{ConversationStore, InMemoryConversationStore};

use std::sync::Arc;

use async_trait::async_trait;

use crate::action::{ActionDeps, ActionRegistry};
use crate::error::{Result, RunOutcome};
use crate::model::{EventEnvelope, ExecutionContext, Message, Participant, ResolvedLlmConfig, RunResult};
use crate::registry::RuleSetRegistry;
use crate::util::generate_event_id;

/// Refreshes the bearer token/API key used for a run's outbound calls, on
/// the coordinator's single retry after a [`crate::error::TokenAuthError`]
/// (spec §8 invariant 10).
///
/// Spec §6 names only Identity's `POST /api/auth/introspect` as a consumed
/// surface — there is no token-issuance endpoint in scope (spec §1
/// Non-goals: "Identity token issuance"). This trait exists so a deployment
/// that *does* have a way to mint a fresh credential (a sidecar, a secrets
/// manager call) can plug it in; [`StaticCredentialRefresher`] is the
/// in-scope default, documented as an Open Question resolution in
/// DESIGN.md.
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    /// Produce a (possibly new) token for `org_id`'s outbound calls.
    async fn refresh(&self, org_id: &str) -> Result<String>;
}

/// No-op refresher: returns the same token the run started with. Enough to
/// exercise the retry-once mechanics (spec §8 invariant 10) when no
/// credential-minting collaborator is configured; a real deployment
/// supplies its own [`CredentialRefresher`].
pub struct StaticCredentialRefresher {
    token: String,
}

impl StaticCredentialRefresher {
    /// Build a refresher that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl CredentialRefresher for StaticCredentialRefresher {
    async fn refresh(&self, _org_id: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// What an ingress `message.new` event carries into
/// [`RunCoordinator::process_event`] (spec §6 ingress schema, reduced to
/// what the coordinator needs once `gateway` has already resolved
/// `orgId`/`assistantKey`/the rule set's trigger).
pub struct InboundEvent {
    pub org_id: String,
    pub conversation_id: String,
    pub assistant_key: String,
    pub trigger: crate::model::Trigger,
    pub message: Option<Message>,
    pub user: Option<Participant>,
    pub llm_config: ResolvedLlmConfig,
    pub trace_id: Option<String>,
    pub event_data: serde_json::Map<String, serde_json::Value>,
}

/// Bundles everything [`RunCoordinator::process_event`] needs: the rule set
/// cache, action dependencies/registry, conversation persistence, the
/// per-conversation mailbox, and the credential refresher (spec §4.5).
pub struct RunCoordinator {
    pub rule_sets: Arc<RuleSetRegistry>,
    pub action_deps: ActionDeps,
    pub action_registry: Arc<ActionRegistry>,
    pub store: Arc<dyn ConversationStore>,
    pub mailbox: Arc<Mailbox>,
    pub credentials: Arc<dyn CredentialRefresher>,
}

impl RunCoordinator {
    /// Process one inbound event end to end (spec §4.5 contract).
    ///
    /// Serializes per `event.conversation_id` through the mailbox (spec §5),
    /// resolves the assistant's rule set with org → default fallback
    /// (returning an empty [`RunResult`] rather than an error when none is
    /// loaded, per spec §4.5 step 1), and retries [`crate::rule::execute`]
    /// exactly once after a credential refresh if the first attempt raises
    /// `TokenAuthError` (spec §8 invariant 10).
    #[tracing::instrument(level = "info", skip_all, fields(conversation_id = %event.conversation_id, assistant_key = %event.assistant_key))]
    pub async fn process_event(&self, event: InboundEvent) -> Result<RunResult> {
        let conversation_id = event.conversation_id.clone();
        self.mailbox
            .enqueue(&conversation_id, move || self.process_event_locked(event))
            .await?
    }

    async fn process_event_locked(&self, event: InboundEvent) -> Result<RunResult> {
        let Some(rule_set) = self.rule_sets.resolve(&event.assistant_key, &event.org_id) else {
            tracing::debug!(assistant_key = %event.assistant_key, org_id = %event.org_id, "no active rule set, returning empty run");
            return Ok(empty_run_result(&event));
        };

        let conversation_state = self.store.load_state(&event.conversation_id).await?;
        let context = self.store.load_context(&event.conversation_id).await?;

        let token = self.credentials.refresh(&event.org_id).await.unwrap_or_default();
        let mut ctx = build_context(&event, conversation_state, context.clone());

        let outcome = crate::rule::execute(&mut ctx, &rule_set, &self.action_deps, &self.action_registry, token, event.trace_id.clone()).await;

        let result = match outcome {
            RunOutcome::Completed(result) => result,
            RunOutcome::TokenExpired(first_err) => {
                tracing::warn!(error = %first_err, "token expired, refreshing credentials and retrying once");
                let refreshed = self.credentials.refresh(&event.org_id).await?;

                let mut retry_ctx = build_context(&event, conversation_state, context);
                match crate::rule::execute(&mut retry_ctx, &rule_set, &self.action_deps, &self.action_registry, refreshed, event.trace_id.clone()).await {
                    RunOutcome::Completed(result) => {
                        ctx = retry_ctx;
                        result
                    }
                    RunOutcome::TokenExpired(second_err) => return Err(second_err.into()),
                }
            }
        };

        if let Some(new_state) = result.new_state {
            self.store.persist_state(&event.conversation_id, new_state).await?;
        }
        self.store.persist_context(&event.conversation_id, ctx.context.clone()).await?;
        self.store.append_run(&event.conversation_id, result.clone()).await?;

        Ok(result)
    }
}

fn build_context(
    event: &InboundEvent,
    conversation_state: crate::model::ConversationState,
    context: serde_json::Map<String, serde_json::Value>,
) -> ExecutionContext {
    ExecutionContext {
        org_id: event.org_id.clone(),
        conversation_id: event.conversation_id.clone(),
        conversation_state,
        trigger: event.trigger,
        event: EventEnvelope {
            id: generate_event_id(),
            event_type: event.trigger,
            timestamp: crate::util::now_iso8601(),
            data: event.event_data.clone(),
        },
        message: event.message.clone(),
        user: event.user.clone(),
        context,
        metadata: serde_json::Map::new(),
        llm_config: event.llm_config.clone(),
        assistant_key: event.assistant_key.clone(),
    }
}

fn empty_run_result(event: &InboundEvent) -> RunResult {
    RunResult {
        run_id: crate::util::generate_run_id(),
        org_id: event.org_id.clone(),
        conversation_id: event.conversation_id.clone(),
        trigger: event.trigger,
        rules_evaluated: 0,
        rules_matched: 0,
        results: Vec::new(),
        new_state: None,
        duration_ms: 0,
        timestamp: crate::util::now_iso8601(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Map};

    use super::*;
    use crate::action::handlers::build_registry;
    use crate::collaborators::mock::MockCollaborators;
    use crate::collaborators::Collaborators;
    use crate::model::{
        ActionConfig, Condition, ConditionGroup, ConditionNode, Logic, Operator, Rule, RuleSet, Trigger,
    };
    use crate::router::Router;

    fn coordinator() -> (RunCoordinator, Arc<InMemoryConversationStore>) {
        let mock = Arc::new(MockCollaborators::default());
        let collaborators = Collaborators {
            identity: mock.clone(),
            catalog: mock.clone(),
            messaging: mock.clone(),
            integrations: mock,
        };
        let rule_sets = Arc::new(RuleSetRegistry::new());
        let router = Arc::new(Router::new(
            Default::default(),
            rule_sets.clone(),
            collaborators.catalog.clone(),
            collaborators.messaging.clone(),
            reqwest::Client::new(),
        ));
        let store = Arc::new(InMemoryConversationStore::new());
        let coordinator = RunCoordinator {
            rule_sets,
            action_deps: ActionDeps::new(collaborators, router, "engine-test", 0),
            action_registry: Arc::new(build_registry()),
            store: store.clone(),
            mailbox: Arc::new(Mailbox::new(DEFAULT_MAILBOX_DEPTH)),
            credentials: Arc::new(StaticCredentialRefresher::new("test-token")),
        };
        (coordinator, store)
    }

    fn inbound(conversation_id: &str) -> InboundEvent {
        InboundEvent {
            org_id: "org-1".into(),
            conversation_id: conversation_id.into(),
            assistant_key: "support-bot".into(),
            trigger: Trigger::MessageReceived,
            message: None,
            user: None,
            llm_config: crate::config::system_defaults(),
            trace_id: None,
            event_data: Map::new(),
        }
    }

    #[tokio::test]
    async fn no_rule_set_returns_empty_run() {
        let (coordinator, _store) = coordinator();
        let result = coordinator.process_event(inbound("conv-1")).await.unwrap();
        assert_eq!(result.rules_evaluated, 0);
        assert_eq!(result.rules_matched, 0);
    }

    #[tokio::test]
    async fn matched_rule_persists_state_context_and_run_log() {
        let (coordinator, store) = coordinator();
        let mut always_true = ConditionGroup::new(Logic::Or);
        always_true.conditions.push(ConditionNode::Leaf(Condition {
            field: "trigger".into(),
            operator: Operator::Eq,
            value: json!("message.received"),
        }));
        let mut set = RuleSet::new("support-bot:default".into(), 1);
        set.rules.push(Rule {
            id: "r1".into(),
            name: "r1".into(),
            priority: 1,
            enabled: true,
            trigger: Trigger::MessageReceived,
            conditions: always_true,
            actions: vec![ActionConfig::new(
                "context.update",
                Map::from_iter([("context".into(), json!({"greeted": true}))]),
            )],
        });
        coordinator.rule_sets.put(set);

        let result = coordinator.process_event(inbound("conv-2")).await.unwrap();
        assert_eq!(result.rules_matched, 1);
        assert_eq!(store.run_log_len("conv-2"), 1);
        let context = store.load_context("conv-2").await.unwrap();
        assert_eq!(context.get("greeted"), Some(&json!(true)));
    }
}
