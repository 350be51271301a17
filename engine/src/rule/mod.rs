//! C4 — Rule Executor (spec §4.4).
//!
//! `execute(ctx, rule_set) -> RunResult`: first-match-wins over a rule set's
//! applicable rules, dispatching the winner's actions sequentially.

use std::time::Instant;

use crate::action::{ActionDeps, ActionRegistry, ActionRun, RunState};
use crate::condition::evaluate_counted;
use crate::error::{RunOutcome, TokenAuthError};
use crate::model::{ActionResult, ExecutionContext, Rule, RuleExecutionResult, RuleSet, RunResult};
use crate::util::{generate_run_id, now_iso8601};

/// Run every applicable rule in priority order until one matches, dispatch
/// its actions, and aggregate the result (spec §4.4 steps 1–5).
///
/// `ctx.conversation_state` is updated in-place as `state.transition`
/// actions succeed, so later actions in the same matched rule observe the
/// new state (spec §4.4 step 3). A [`TokenAuthError`] escaping the
/// dispatcher aborts the run entirely and is reported as
/// [`RunOutcome::TokenExpired`]; every other action or handler error is
/// folded into the rule's `error` field instead (spec §4.4 step 5, §7).
pub async fn execute(
    ctx: &mut ExecutionContext,
    rule_set: &RuleSet,
    deps: &ActionDeps,
    registry: &ActionRegistry,
    token: impl Into<String>,
    trace_id: Option<String>,
) -> RunOutcome<RunResult> {
    let started = Instant::now();
    let applicable = rule_set.applicable(ctx.trigger);

    let mut state = RunState::new(ctx.conversation_state, token, trace_id);
    let mut results = Vec::new();
    let mut rules_matched = 0u32;
    let mut rules_evaluated = 0u32;
    let mut new_state = None;

    for rule in applicable {
        rules_evaluated += 1;
        let rule_started = Instant::now();
        let (matched, conditions_evaluated) = evaluate_counted(&rule.conditions, ctx);
        if !matched {
            results.push(RuleExecutionResult {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                matched: false,
                conditions_evaluated,
                actions_executed: Vec::new(),
                error: None,
                duration_ms: elapsed_ms(rule_started),
            });
            continue;
        }

        rules_matched += 1;
        let state_before = state.conversation_state;
        let outcome = {
            let mut run = ActionRun { ctx: &*ctx, state: &mut state, deps, registry };
            run_actions(rule, &mut run).await
        };

        match outcome {
            Ok(actions_executed) => {
                ctx.conversation_state = state.conversation_state;
                if state.conversation_state != state_before {
                    new_state = Some(state.conversation_state);
                }
                results.push(RuleExecutionResult {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    matched: true,
                    conditions_evaluated,
                    actions_executed,
                    error: None,
                    duration_ms: elapsed_ms(rule_started),
                });
            }
            Err(TokenAuthError(msg)) => return RunOutcome::TokenExpired(TokenAuthError(msg)),
        }
        // First-match-wins (spec §4.4 step 3).
        break;
    }

    for (key, value) in std::mem::take(&mut state.context_patch) {
        ctx.context.insert(key, value);
    }

    RunOutcome::Completed(RunResult {
        run_id: generate_run_id(),
        org_id: ctx.org_id.clone(),
        conversation_id: ctx.conversation_id.clone(),
        trigger: ctx.trigger,
        rules_evaluated,
        rules_matched,
        results,
        new_state,
        duration_ms: elapsed_ms(started),
        timestamp: now_iso8601(),
    })
}

/// Dispatch one matched rule's actions in declaration order, stopping at the
/// first failure (spec §4.4: "Result rule within a rule").
async fn run_actions(rule: &Rule, run: &mut ActionRun<'_>) -> Result<Vec<ActionResult>, TokenAuthError> {
    let registry = run.registry;
    let mut executed = Vec::with_capacity(rule.actions.len());
    for action in &rule.actions {
        let result = registry.dispatch(action, run).await?;
        let stop = !result.success;
        executed.push(result);
        if stop {
            break;
        }
    }
    Ok(executed)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::*;
    use crate::action::handlers::build_registry;
    use crate::action::ActionDeps;
    use crate::collaborators::mock::MockCollaborators;
    use crate::collaborators::Collaborators;
    use crate::model::{
        ActionConfig, Condition, ConditionGroup, ConditionNode, ConversationState, EventEnvelope, Logic, Operator, Trigger,
    };
    use crate::registry::RuleSetRegistry;
    use crate::router::Router;
    use std::sync::Arc;

    fn group_of(node: ConditionNode) -> ConditionGroup {
        let mut group = ConditionGroup::new(Logic::Or);
        group.conditions.push(node);
        group
    }

    fn test_ctx() -> ExecutionContext {
        ExecutionContext {
            org_id: "org-1".into(),
            conversation_id: "conv-1".into(),
            conversation_state: ConversationState::Idle,
            trigger: Trigger::MessageReceived,
            event: EventEnvelope {
                id: "evt-1".into(),
                event_type: Trigger::MessageReceived,
                timestamp: now_iso8601(),
                data: Map::new(),
            },
            message: None,
            user: None,
            context: Map::new(),
            metadata: Map::new(),
            llm_config: crate::config::system_defaults(),
            assistant_key: "support-bot".into(),
        }
    }

    fn test_deps() -> ActionDeps {
        let mock = Arc::new(MockCollaborators::default());
        let collaborators = Collaborators {
            identity: mock.clone(),
            catalog: mock.clone(),
            messaging: mock.clone(),
            integrations: mock,
        };
        let registry = Arc::new(RuleSetRegistry::new());
        let router = Arc::new(Router::new(
            Default::default(),
            registry,
            collaborators.catalog.clone(),
            collaborators.messaging.clone(),
            reqwest::Client::new(),
        ));
        ActionDeps::new(collaborators, router, "engine-test", 0)
    }

    #[tokio::test]
    async fn first_match_wins_and_stops_evaluating() {
        let mut ctx = test_ctx();
        let always_true = group_of(ConditionNode::Leaf(Condition {
            field: "trigger".into(),
            operator: Operator::Eq,
            value: json!("message.received"),
        }));

        let mut set = RuleSet::new("support-bot:default".into(), 1);
        set.rules.push(Rule {
            id: "high".into(),
            name: "high".into(),
            priority: 10,
            enabled: true,
            trigger: Trigger::MessageReceived,
            conditions: always_true.clone(),
            actions: vec![ActionConfig::new("context.update", Map::from_iter([("context".into(), json!({"hit": "high"}))]))],
        });
        set.rules.push(Rule {
            id: "low".into(),
            name: "low".into(),
            priority: 1,
            enabled: true,
            trigger: Trigger::MessageReceived,
            conditions: always_true,
            actions: vec![ActionConfig::new("context.update", Map::from_iter([("context".into(), json!({"hit": "low"}))]))],
        });

        let deps = test_deps();
        let registry = build_registry();
        let outcome = execute(&mut ctx, &set, &deps, &registry, "test-token", None).await;
        let result = outcome.expect_completed("run should complete");

        assert_eq!(result.rules_matched, 1);
        assert_eq!(result.rules_evaluated, 1);
        assert!(result.stopped_early(2));
        assert_eq!(ctx.context.get("hit"), Some(&json!("high")));
    }

    #[tokio::test]
    async fn no_match_leaves_context_and_state_untouched() {
        let mut ctx = test_ctx();
        let mut never = ConditionGroup::new(Logic::And);
        never.conditions.push(ConditionNode::Leaf(Condition {
            field: "trigger".into(),
            operator: Operator::Eq,
            value: json!("nope"),
        }));
        let mut set = RuleSet::new("support-bot:default".into(), 1);
        set.rules.push(Rule {
            id: "r1".into(),
            name: "r1".into(),
            priority: 1,
            enabled: true,
            trigger: Trigger::MessageReceived,
            conditions: never,
            actions: Vec::new(),
        });

        let deps = test_deps();
        let registry = build_registry();
        let outcome = execute(&mut ctx, &set, &deps, &registry, "test-token", None).await;
        let result = outcome.expect_completed("run should complete");
        assert_eq!(result.rules_matched, 0);
        assert!(result.new_state.is_none());
        assert!(ctx.context.is_empty());
    }
}
