//! End-to-end scenarios against the public `RunCoordinator`/`rule::execute`
//! surface (spec §8 "literal scenarios" S1-S6), run through `MockCollaborators`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map};

use engine::action::handlers::build_registry;
use engine::action::ActionDeps;
use engine::collaborators::mock::MockCollaborators;
use engine::collaborators::{AssistantRecord, Collaborators};
use engine::model::{
    ActionConfig, Condition, ConditionGroup, ConditionNode, ConversationState, Logic, Message,
    Operator, Priority, Rule, RuleSet, Trigger, UserType,
};
use engine::registry::RuleSetRegistry;
use engine::router::{EventBus, MeshEnvelope, Router};
use engine::run::{InMemoryConversationStore, InboundEvent, Mailbox, RunCoordinator, StaticCredentialRefresher, DEFAULT_MAILBOX_DEPTH};

fn inbound_message(content: &str) -> Message {
    Message {
        id: "m1".into(),
        sender_id: "user-1".into(),
        sender_type: UserType::User,
        content: content.into(),
        content_type: None,
        metadata: Map::new(),
        created_at: "2026-01-01T00:00:00Z".into(),
        sequence: None,
        priority: Priority::Normal,
        interruptible: false,
        preempted_by: None,
    }
}

fn leaf(field: &str, operator: Operator, value: serde_json::Value) -> ConditionNode {
    ConditionNode::Leaf(Condition { field: field.into(), operator, value })
}

fn and_of(nodes: Vec<ConditionNode>) -> ConditionGroup {
    ConditionGroup { logic: Logic::And, conditions: nodes }
}

struct Harness {
    coordinator: RunCoordinator,
    store: Arc<InMemoryConversationStore>,
    mock: Arc<MockCollaborators>,
}

fn harness() -> Harness {
    harness_with_event_bus(None)
}

/// A recording mesh client that always accepts, so routing scenarios don't
/// need to spin up a webhook listener for the fallback path.
struct AcceptingEventBus {
    published: std::sync::Mutex<Vec<MeshEnvelope>>,
}

#[async_trait]
impl EventBus for AcceptingEventBus {
    async fn publish(&self, envelope: &MeshEnvelope) -> Option<()> {
        self.published.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(envelope.clone());
        Some(())
    }
}

fn harness_with_event_bus(event_bus: Option<Arc<dyn EventBus>>) -> Harness {
    let mock = Arc::new(MockCollaborators::default());
    let collaborators = Collaborators {
        identity: mock.clone(),
        catalog: mock.clone(),
        messaging: mock.clone(),
        integrations: mock.clone(),
    };
    let rule_sets = Arc::new(RuleSetRegistry::new());
    let mut router = Router::new(
        Default::default(),
        rule_sets.clone(),
        collaborators.catalog.clone(),
        collaborators.messaging.clone(),
        reqwest::Client::new(),
    );
    if let Some(bus) = event_bus {
        router = router.with_event_bus(bus);
    }
    let store = Arc::new(InMemoryConversationStore::new());
    let coordinator = RunCoordinator {
        rule_sets,
        action_deps: ActionDeps::new(collaborators, Arc::new(router), "scenario-test", 0),
        action_registry: Arc::new(build_registry()),
        store: store.clone(),
        mailbox: Arc::new(Mailbox::new(DEFAULT_MAILBOX_DEPTH)),
        credentials: Arc::new(StaticCredentialRefresher::new("test-token")),
    };
    Harness { coordinator, store, mock }
}

fn inbound(message: Option<Message>) -> InboundEvent {
    InboundEvent {
        org_id: "org-1".into(),
        conversation_id: "conv-1".into(),
        assistant_key: "support-bot".into(),
        trigger: Trigger::MessageReceived,
        message,
        user: None,
        llm_config: engine::config::system_defaults(),
        trace_id: None,
        event_data: Map::new(),
    }
}

fn rule(id: &str, priority: i64, conditions: ConditionGroup, actions: Vec<ActionConfig>) -> Rule {
    Rule { id: id.into(), name: id.into(), priority, enabled: true, trigger: Trigger::MessageReceived, conditions, actions }
}

/// S1 - Simple match: one rule on `message.content contains "help"`.
#[tokio::test]
async fn s1_simple_match_sends_configured_reply() {
    let h = harness();
    let mut set = RuleSet::new("support-bot:default".into(), 1);
    set.rules.push(rule(
        "help",
        10,
        and_of(vec![leaf("message.content", Operator::Contains, json!("help"))]),
        vec![ActionConfig::new("message.send", Map::from_iter([("content".into(), json!("here is help"))]))],
    ));
    h.coordinator.rule_sets.put(set);

    let result = h.coordinator.process_event(inbound(Some(inbound_message("I need help")))).await.unwrap();

    assert_eq!(result.rules_matched, 1);
    assert!(result.new_state.is_none());
    let sent = &h.mock.recorded.lock().unwrap().sent_messages;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.content, "here is help");
    assert_eq!(h.store.load_state("conv-1").await.unwrap(), ConversationState::Idle);
}

/// S2 - Priority wins: two matching rules, priorities 5 and 10.
#[tokio::test]
async fn s2_priority_wins() {
    let h = harness();
    let always = and_of(vec![leaf("trigger", Operator::Eq, json!("message.received"))]);
    let mut set = RuleSet::new("support-bot:default".into(), 1);
    set.rules.push(rule(
        "low",
        5,
        always.clone(),
        vec![ActionConfig::new("message.send", Map::from_iter([("content".into(), json!("low priority"))]))],
    ));
    set.rules.push(rule(
        "high",
        10,
        always,
        vec![ActionConfig::new("message.send", Map::from_iter([("content".into(), json!("high priority"))]))],
    ));
    h.coordinator.rule_sets.put(set);

    let result = h.coordinator.process_event(inbound(Some(inbound_message("hi")))).await.unwrap();

    assert_eq!(result.rules_matched, 1);
    let sent = &h.mock.recorded.lock().unwrap().sent_messages;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.content, "high priority");
}

/// S3 - State transition: `idle -> ai_active` is legal.
#[tokio::test]
async fn s3_legal_state_transition_persists() {
    let h = harness();
    let always = and_of(vec![leaf("trigger", Operator::Eq, json!("message.received"))]);
    let mut set = RuleSet::new("support-bot:default".into(), 1);
    set.rules.push(rule(
        "activate",
        1,
        always,
        vec![ActionConfig::new("state.transition", Map::from_iter([("newState".into(), json!("ai_active"))]))],
    ));
    h.coordinator.rule_sets.put(set);

    let result = h.coordinator.process_event(inbound(Some(inbound_message("hi")))).await.unwrap();

    assert_eq!(result.new_state, Some(ConversationState::AiActive));
    assert_eq!(h.store.load_state("conv-1").await.unwrap(), ConversationState::AiActive);
}

/// S4 - Illegal transition: `idle -> agent_active` is not in the legal set.
#[tokio::test]
async fn s4_illegal_state_transition_rejected() {
    let h = harness();
    let always = and_of(vec![leaf("trigger", Operator::Eq, json!("message.received"))]);
    let mut set = RuleSet::new("support-bot:default".into(), 1);
    set.rules.push(rule(
        "jump",
        1,
        always,
        vec![ActionConfig::new("state.transition", Map::from_iter([("newState".into(), json!("agent_active"))]))],
    ));
    h.coordinator.rule_sets.put(set);

    let result = h.coordinator.process_event(inbound(Some(inbound_message("hi")))).await.unwrap();

    assert!(result.new_state.is_none());
    assert_eq!(h.store.load_state("conv-1").await.unwrap(), ConversationState::Idle);
    let action = &result.results[0].actions_executed[0];
    assert!(!action.success);
}

/// S5 - Route with alias: `@Logs` normalizes to `log-analyst`, joins the
/// conversation as that assistant, forwards one `message.new`, and
/// suppresses this assistant's own reply.
#[tokio::test]
async fn s5_route_with_alias_suppresses_reply() {
    let bus = Arc::new(AcceptingEventBus { published: std::sync::Mutex::new(Vec::new()) });
    let h = harness_with_event_bus(Some(bus.clone()));

    // `log-analyst` must be a known assistant for the router to route to it.
    h.coordinator.rule_sets.put(RuleSet::new("log-analyst:default".into(), 1));
    h.mock.register_assistant(AssistantRecord {
        key: "log-analyst".into(),
        entity_id: "log-analyst".into(),
        webhook_url: None,
    });

    let mut set = RuleSet::new("support-bot:default".into(), 1);
    set.rules.push(rule(
        "route-logs",
        1,
        and_of(vec![leaf("trigger", Operator::Eq, json!("message.received"))]),
        vec![
            ActionConfig::new(
                "assistant.route",
                Map::from_iter([("targetAssistant".into(), json!("@Logs")), ("reason".into(), json!("user asked about logs"))]),
            ),
            ActionConfig::new("message.send", Map::from_iter([("content".into(), json!("should be suppressed"))])),
        ],
    ));
    h.coordinator.rule_sets.put(set);

    let result = h.coordinator.process_event(inbound(Some(inbound_message("check the logs")))).await.unwrap();

    assert_eq!(result.rules_matched, 1);
    let actions = &result.results[0].actions_executed;
    assert!(actions[0].success);
    assert_eq!(actions[0].output.as_ref().unwrap()["targetAssistant"], json!("log-analyst"));
    assert_eq!(actions[1].output.as_ref().unwrap()["suppressed"], json!(true));

    let joined = &h.mock.recorded.lock().unwrap().joined;
    assert_eq!(joined, &vec!["conv-1".to_string()]);
    let published = bus.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].recipients, vec!["assistant:log-analyst".to_string()]);
    assert!(h.mock.recorded.lock().unwrap().sent_messages.is_empty());
}

/// S6 - Loop with `continueOnError`: three items, a `condition`-gated
/// illegal state transition fails only on the middle one, the rest still run.
#[tokio::test]
async fn s6_loop_continue_on_error_records_failures_and_still_succeeds() {
    let h = harness();
    let always = and_of(vec![leaf("trigger", Operator::Eq, json!("message.received"))]);
    let mut set = RuleSet::new("support-bot:default".into(), 1);
    set.rules.push(rule(
        "loop-items",
        1,
        always,
        vec![ActionConfig::new(
            "loop",
            Map::from_iter([
                ("as".into(), json!("item")),
                ("items".into(), json!(["a", "b", "c"])),
                ("continueOnError".into(), json!(true)),
                (
                    "actions".into(),
                    json!([{
                        "type": "condition",
                        "params": {
                            "if": { "logic": "and", "conditions": [{ "field": "context.item", "operator": "eq", "value": "b" }] },
                            "then": [{ "type": "state.transition", "params": { "newState": "agent_active" } }],
                        },
                    }]),
                ),
            ]),
        )],
    ));
    h.coordinator.rule_sets.put(set);

    let result = h.coordinator.process_event(inbound(Some(inbound_message("run the loop")))).await.unwrap();

    assert_eq!(result.rules_matched, 1);
    let action = &result.results[0].actions_executed[0];
    assert!(action.success);
    let output = action.output.as_ref().unwrap();
    assert_eq!(output["iterations"], json!(3));
    assert_eq!(output["failedIterations"], json!(1));
}
