//! `state.transition` (spec §4.3, §8 invariant 6).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::error::TokenAuthError;
use crate::model::ActionResult;

pub struct StateTransitionHandler;

#[async_trait]
impl ActionHandler for StateTransitionHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(target_raw) = params.get("newState").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("state.transition", "params.newState must be a string", 0));
        };
        let Some(target) = parse_state(target_raw) else {
            return Ok(ActionResult::failed("state.transition", format!("unknown state '{target_raw}'"), 0));
        };

        if !run.state.conversation_state.can_transition_to(target) {
            return Ok(ActionResult::failed(
                "state.transition",
                format!("illegal transition {:?} -> {:?}", run.state.conversation_state, target),
                0,
            ));
        }

        run.state.conversation_state = target;
        Ok(ActionResult::ok("state.transition", Some(json!({ "newState": target })), 0))
    }
}

fn parse_state(raw: &str) -> Option<crate::model::ConversationState> {
    use crate::model::ConversationState::{AgentActive, AiActive, Archived, HandoffPending, Idle, Resolved, WaitingForUser};
    match raw {
        "idle" => Some(Idle),
        "ai_active" => Some(AiActive),
        "waiting_for_user" => Some(WaitingForUser),
        "handoff_pending" => Some(HandoffPending),
        "agent_active" => Some(AgentActive),
        "resolved" => Some(Resolved),
        "archived" => Some(Archived),
        _ => None,
    }
}
