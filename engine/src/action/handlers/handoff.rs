//! `handoff.create` / `handoff.assign` / `handoff.resolve` (spec §4.3, §9
//! Open Question 2, §3 Glossary "Handoff").
//!
//! Pure record construction: each handler posts one control event and
//! returns its shape. Messaging owns persistence; the core never stores a
//! handoff record itself.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::collaborators::ControlEvent;
use crate::error::TokenAuthError;
use crate::model::ActionResult;
use crate::util::{generate_id, now_iso8601};

async fn post(run: &mut ActionRun<'_>, action_type: &str, event: ControlEvent) -> Result<ActionResult, TokenAuthError> {
    let call = run.state.call_context(&run.ctx.org_id, &run.deps.service_id, None);
    let output = json!({
        "event": event.event,
        "target": event.target,
        "reason": event.reason,
    });
    match run.deps.collaborators.messaging.post_control(&call, &run.ctx.conversation_id, &event).await {
        Ok(()) => Ok(ActionResult::ok(action_type, Some(output), 0)),
        Err(err) => Ok(ActionResult::failed(action_type, err.to_string(), 0)),
    }
}

pub struct HandoffCreateHandler;

#[async_trait]
impl ActionHandler for HandoffCreateHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let reason = params.get("reason").and_then(Value::as_str).map(str::to_string);
        let event = ControlEvent {
            event: "handoff.requested".to_string(),
            conversation_id: run.ctx.conversation_id.clone(),
            target: None,
            reason,
            preempted_by: None,
            run_id: Some(generate_id("handoff")),
            trace_id: run.state.trace_id.clone(),
            effective_at: now_iso8601(),
        };
        post(run, "handoff.create", event).await
    }
}

pub struct HandoffAssignHandler;

#[async_trait]
impl ActionHandler for HandoffAssignHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(target) = params.get("target").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("handoff.assign", "params.target must be a string", 0));
        };
        let event = ControlEvent {
            event: "handoff.assigned".to_string(),
            conversation_id: run.ctx.conversation_id.clone(),
            target: Some(target.to_string()),
            reason: params.get("reason").and_then(Value::as_str).map(str::to_string),
            preempted_by: None,
            run_id: None,
            trace_id: run.state.trace_id.clone(),
            effective_at: now_iso8601(),
        };
        post(run, "handoff.assign", event).await
    }
}

pub struct HandoffResolveHandler;

#[async_trait]
impl ActionHandler for HandoffResolveHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let event = ControlEvent {
            event: "handoff.resolved".to_string(),
            conversation_id: run.ctx.conversation_id.clone(),
            target: None,
            reason: params.get("reason").and_then(Value::as_str).map(str::to_string),
            preempted_by: None,
            run_id: None,
            trace_id: run.state.trace_id.clone(),
            effective_at: now_iso8601(),
        };
        post(run, "handoff.resolve", event).await
    }
}
