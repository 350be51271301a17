//! `context.update` (spec §4.3).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::error::TokenAuthError;
use crate::model::ActionResult;

pub struct ContextUpdateHandler;

#[async_trait]
impl ActionHandler for ContextUpdateHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(patch) = params.get("context").and_then(Value::as_object) else {
            return Ok(ActionResult::failed("context.update", "params.context must be an object", 0));
        };

        // Last-writer-wins per top-level key within this run (spec §4.3).
        for (key, value) in patch {
            run.state.context_patch.insert(key.clone(), value.clone());
        }

        Ok(ActionResult::ok("context.update", Some(json!({ "newContext": patch })), 0))
    }
}
