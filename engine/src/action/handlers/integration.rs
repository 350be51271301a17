//! `integration.invoke` (spec §4.3).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::collaborators::IntegrationInvokeRequest;
use crate::error::TokenAuthError;
use crate::model::ActionResult;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub struct IntegrationInvokeHandler;

#[async_trait]
impl ActionHandler for IntegrationInvokeHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(namespace) = params.get("namespace").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("integration.invoke", "params.namespace must be a string", 0));
        };
        let call_params = params.get("params").and_then(Value::as_object).cloned().unwrap_or_default();
        let timeout = params.get("timeoutMs").and_then(Value::as_u64).unwrap_or(DEFAULT_TIMEOUT_MS);

        let request = IntegrationInvokeRequest {
            namespace: namespace.to_string(),
            params: call_params,
            timeout,
        };
        let call = run.state.call_context(&run.ctx.org_id, &run.deps.service_id, None);
        match run.deps.collaborators.integrations.invoke_integration(&call, &request).await {
            Ok(result) => Ok(ActionResult::ok("integration.invoke", Some(json!({ "result": result })), 0)),
            Err(err) => Ok(ActionResult::failed("integration.invoke", err.to_string(), 0)),
        }
    }
}
