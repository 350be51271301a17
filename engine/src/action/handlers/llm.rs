//! `llm.invoke` (spec §4.3).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::retry::backoff_delay;
use crate::action::{ActionHandler, ActionRun};
use crate::collaborators::LlmInvokeRequest;
use crate::config::action_config;
use crate::error::{ActionError, TokenAuthError};
use crate::model::ActionResult;

/// Default per-call timeout when neither `params.timeoutMs` nor the
/// resolved profile's reliability section sets one (spec §4.3).
const DEFAULT_TIMEOUT_MS: u64 = 45_000;

/// Outcome of the retry loop. A non-retryable Integrations 401 is an
/// ordinary `AuthError` action failure, not the token-expiry signal — that
/// one is raised by the dispatcher's own introspection check before any
/// handler runs (spec §6).
enum Outcome {
    Success(crate::collaborators::LlmInvokeResponse),
    Failed(ActionError),
}

pub struct LlmInvokeHandler;

#[async_trait]
impl ActionHandler for LlmInvokeHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let action_llm = action_config(&run.ctx.llm_config, params);
        let reliability = run.ctx.llm_config.reliability.clone();
        let timeout_ms = params
            .get("timeoutMs")
            .and_then(Value::as_u64)
            .unwrap_or(if reliability.timeout_ms > 0 { reliability.timeout_ms } else { DEFAULT_TIMEOUT_MS });
        let operation = params.get("operation").and_then(Value::as_str).unwrap_or("chat.completions").to_string();
        let mut invoke_params = params.clone();
        invoke_params.remove("timeoutMs");
        invoke_params.remove("operation");

        let call = run.state.call_context(&run.ctx.org_id, &run.deps.service_id, None);
        let collaborators = run.deps.collaborators.clone();

        let request_loop = async move {
            let mut attempt = 0u32;
            loop {
                let request = LlmInvokeRequest {
                    provider: action_llm.provider.clone(),
                    model: action_llm.model.clone(),
                    operation: operation.clone(),
                    params: invoke_params.clone(),
                    timeout: timeout_ms,
                };
                match collaborators.integrations.invoke_llm(&call, &request).await {
                    Ok(response) => return Outcome::Success(response),
                    Err(err) if err.is_retryable() && attempt < reliability.max_retries => {
                        tokio::time::sleep(backoff_delay(reliability.initial_backoff_ms, attempt)).await;
                        attempt += 1;
                    }
                    Err(err) => return Outcome::Failed(err),
                }
            }
        };

        match tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), request_loop).await {
            Err(_elapsed) => Ok(ActionResult::failed("llm.invoke", format!("timed out after {timeout_ms}ms"), 0)),
            Ok(Outcome::Failed(err)) => Ok(ActionResult::failed("llm.invoke", err.to_string(), 0)),
            Ok(Outcome::Success(response)) => Ok(ActionResult::ok(
                "llm.invoke",
                Some(json!({
                    "provider": response.provider,
                    "model": response.model,
                    "content": response.content,
                    "usage": response.usage,
                    "finishReason": response.finish_reason,
                    "metadata": response.metadata,
                })),
                0,
            )),
        }
    }
}
