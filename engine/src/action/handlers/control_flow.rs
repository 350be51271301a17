//! `wait`, `parallel`, `condition`, `loop` (spec §4.3).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::condition::evaluate;
use crate::error::TokenAuthError;
use crate::model::{ActionConfig, ActionResult, ConditionGroup};

/// Safety cap on `loop` when `params.maxIterations` is absent (spec §4.3,
/// §8 invariant 7).
const DEFAULT_MAX_ITERATIONS: u64 = 100;

pub struct WaitHandler;

#[async_trait]
impl ActionHandler for WaitHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let duration_ms = params.get("durationMs").and_then(Value::as_u64).unwrap_or(0);
        let sleep = tokio::time::sleep(std::time::Duration::from_millis(duration_ms));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => break,
                () = tokio::task::yield_now(), if run.state.cancellation.is_cancelled() => {
                    return Ok(ActionResult::failed("wait", "cancelled", 0));
                }
            }
        }
        Ok(ActionResult::ok("wait", None, 0))
    }
}

pub struct ParallelHandler;

#[async_trait]
impl ActionHandler for ParallelHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(actions) = parse_actions(params) else {
            return Ok(ActionResult::failed("parallel", "params.actions must be a list of action configs", 0));
        };
        if actions.is_empty() {
            return Ok(ActionResult::ok("parallel", Some(json!({ "results": [] })), 0));
        }

        let mut local_states: Vec<crate::action::RunState> = actions
            .iter()
            .map(|_| crate::action::RunState {
                conversation_state: run.state.conversation_state,
                suppress_response: run.state.suppress_response,
                context_patch: run.state.context_patch.clone(),
                token: run.state.token.clone(),
                trace_id: run.state.trace_id.clone(),
                cancellation: run.state.cancellation.clone(),
            })
            .collect();

        let ctx = run.ctx;
        let deps = run.deps;
        let registry = run.registry;
        let futures = actions.iter().zip(local_states.iter_mut()).map(|(action, state)| {
            let mut child_run = ActionRun { ctx, state, deps, registry };
            async move { registry.dispatch(action, &mut child_run).await }
        });

        let outcomes = futures::future::join_all(futures).await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut all_ok = true;
        for outcome in outcomes {
            match outcome {
                Ok(result) => {
                    all_ok &= result.success;
                    results.push(result);
                }
                Err(token_err) => return Err(token_err),
            }
        }

        // No defined ordering among children (spec §5); merge their context
        // patches and conversation-state changes in declaration order for a
        // deterministic result.
        for state in &local_states {
            for (key, value) in &state.context_patch {
                run.state.context_patch.insert(key.clone(), value.clone());
            }
        }
        if let Some(last) = local_states.last() {
            run.state.conversation_state = last.conversation_state;
        }

        let results_json: Vec<Value> = results.iter().map(|r| serde_json::to_value(r).unwrap_or(Value::Null)).collect();
        if all_ok {
            Ok(ActionResult::ok("parallel", Some(json!({ "results": results_json })), 0))
        } else {
            let mut failed = ActionResult::failed("parallel", "one or more child actions failed", 0);
            failed.output = Some(json!({ "results": results_json }));
            Ok(failed)
        }
    }
}

pub struct ConditionHandler;

#[async_trait]
impl ActionHandler for ConditionHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(if_value) = params.get("if") else {
            return Ok(ActionResult::failed("condition", "params.if must be a condition group", 0));
        };
        let group: ConditionGroup = match serde_json::from_value(if_value.clone()) {
            Ok(g) => g,
            Err(err) => return Ok(ActionResult::failed("condition", format!("invalid condition group: {err}"), 0)),
        };

        let branch_key = if evaluate(&group, run.ctx) { "then" } else { "else" };
        let Some(branch_actions) = params.get(branch_key).and_then(|v| parse_actions_value(v)) else {
            return Ok(ActionResult::ok("condition", Some(json!({ "branch": branch_key, "results": [] })), 0));
        };

        let registry = run.registry;
        let mut results = Vec::with_capacity(branch_actions.len());
        let mut success = true;
        for action in &branch_actions {
            let result = registry.dispatch(action, run).await?;
            success &= result.success;
            let stop = !result.success;
            results.push(result);
            if stop {
                break;
            }
        }

        let results_json: Vec<Value> = results.iter().map(|r| serde_json::to_value(r).unwrap_or(Value::Null)).collect();
        if success {
            Ok(ActionResult::ok("condition", Some(json!({ "branch": branch_key, "results": results_json })), 0))
        } else {
            let mut failed = ActionResult::failed("condition", format!("{branch_key} branch had a failing action"), 0);
            failed.output = Some(json!({ "branch": branch_key, "results": results_json }));
            Ok(failed)
        }
    }
}

pub struct LoopHandler;

#[async_trait]
impl ActionHandler for LoopHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(as_name) = params.get("as").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("loop", "params.as is required", 0));
        };
        let Some(items) = resolve_items(params, run) else {
            return Ok(ActionResult::failed("loop", "params.items must resolve to an array", 0));
        };
        let Some(body) = parse_actions(params) else {
            return Ok(ActionResult::failed("loop", "params.actions must be a list of action configs", 0));
        };

        let max_iterations = params.get("maxIterations").and_then(Value::as_u64).unwrap_or(DEFAULT_MAX_ITERATIONS);
        let continue_on_error = params.get("continueOnError").and_then(Value::as_bool).unwrap_or(false);
        let index_name = params.get("index").and_then(Value::as_str);

        let mut iterations = 0u64;
        let mut failed_iterations = 0u64;

        for (index, item) in items.into_iter().enumerate() {
            if iterations >= max_iterations {
                break;
            }
            let mut iter_ctx = run.ctx.clone();
            iter_ctx.context.insert(as_name.to_string(), item);
            if let Some(index_name) = index_name {
                iter_ctx.context.insert(index_name.to_string(), json!(index));
            }

            let mut iteration_failed = false;
            for action in &body {
                let mut child_run = ActionRun { ctx: &iter_ctx, state: &mut *run.state, deps: run.deps, registry: run.registry };
                let result = run.registry.dispatch(action, &mut child_run).await?;
                if !result.success {
                    iteration_failed = true;
                    break;
                }
            }
            iterations += 1;
            if iteration_failed {
                failed_iterations += 1;
                if !continue_on_error {
                    break;
                }
            }
        }

        let success = continue_on_error || failed_iterations == 0;
        let output = json!({ "iterations": iterations, "failedIterations": failed_iterations });
        if success {
            Ok(ActionResult::ok("loop", Some(output), 0))
        } else {
            let mut failed = ActionResult::failed("loop", "an iteration failed and continueOnError is false", 0);
            failed.output = Some(output);
            Ok(failed)
        }
    }
}

fn resolve_items(params: &Map<String, Value>, run: &ActionRun<'_>) -> Option<Vec<Value>> {
    match params.get("items") {
        Some(Value::String(path)) => run.ctx.resolve_path(path).and_then(|v| v.as_array().cloned()),
        Some(Value::Array(items)) => Some(items.clone()),
        _ => None,
    }
}

fn parse_actions(params: &Map<String, Value>) -> Option<Vec<ActionConfig>> {
    params.get("actions").and_then(parse_actions_value)
}

fn parse_actions_value(value: &Value) -> Option<Vec<ActionConfig>> {
    serde_json::from_value(value.clone()).ok()
}
