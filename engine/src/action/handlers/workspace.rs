//! `workspace.create` / `workspace.destroy` (spec §4.3).
//!
//! The execution environment a workspace would provision is out of scope
//! for this engine — no collaborator for it is named in spec §6. These
//! handlers only produce the documented return shape.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::error::TokenAuthError;
use crate::model::ActionResult;
use crate::util::generate_id;

pub struct WorkspaceCreateHandler;

#[async_trait]
impl ActionHandler for WorkspaceCreateHandler {
    async fn execute(&self, params: &Map<String, Value>, _run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let workspace_id = generate_id("wksp");
        let name = params.get("name").and_then(Value::as_str).unwrap_or("untitled");
        Ok(ActionResult::ok(
            "workspace.create",
            Some(json!({ "workspaceId": workspace_id, "name": name, "status": "created" })),
            0,
        ))
    }
}

pub struct WorkspaceDestroyHandler;

#[async_trait]
impl ActionHandler for WorkspaceDestroyHandler {
    async fn execute(&self, params: &Map<String, Value>, _run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(workspace_id) = params.get("workspaceId").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("workspace.destroy", "params.workspaceId must be a string", 0));
        };
        Ok(ActionResult::ok(
            "workspace.destroy",
            Some(json!({ "workspaceId": workspace_id, "status": "destroyed" })),
            0,
        ))
    }
}
