//! `message.send` (spec §4.3).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::error::TokenAuthError;
use crate::model::{ActionResult, Message, Priority, UserType};
use crate::util::{generate_id, now_iso8601};

pub struct MessageSendHandler;

#[async_trait]
impl ActionHandler for MessageSendHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        if run.state.suppress_response {
            return Ok(ActionResult::ok("message.send", Some(json!({ "suppressed": true })), 0));
        }

        let Some(content) = params.get("content").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("message.send", "params.content must be a string", 0));
        };

        let priority = params
            .get("priority")
            .and_then(Value::as_str)
            .and_then(priority_from_str)
            .unwrap_or_default();
        let interruptible = params.get("interruptible").and_then(Value::as_bool).unwrap_or(false);

        let message = Message {
            id: generate_id("msg"),
            sender_id: format!("assistant:{}", run.ctx.assistant_key),
            sender_type: UserType::Agent,
            content: content.to_string(),
            content_type: params.get("contentType").and_then(Value::as_str).map(str::to_string),
            metadata: Map::new(),
            created_at: now_iso8601(),
            sequence: None,
            priority,
            interruptible,
            preempted_by: None,
        };

        let call = run.state.call_context(&run.ctx.org_id, &run.deps.service_id, Some(format!("assistant:{}", run.ctx.assistant_key)));
        match run.deps.collaborators.messaging.send_message(&call, &run.ctx.conversation_id, &message).await {
            Ok(()) => Ok(ActionResult::ok("message.send", Some(json!({ "messageId": message.id })), 0)),
            Err(err) => Ok(ActionResult::failed("message.send", err.to_string(), 0)),
        }
    }
}

fn priority_from_str(s: &str) -> Option<Priority> {
    match s {
        "low" => Some(Priority::Low),
        "normal" => Some(Priority::Normal),
        "high" => Some(Priority::High),
        "critical" => Some(Priority::Critical),
        _ => None,
    }
}
