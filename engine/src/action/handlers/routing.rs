//! `assistant.route` / `embedding.route` (spec §4.6).
//!
//! Both share [`crate::router::Router::route_downstream`] for the
//! downstream effect; only target selection differs here.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::collaborators::LlmInvokeRequest;
use crate::config::should_use_llm_fallback;
use crate::error::TokenAuthError;
use crate::model::ActionResult;
use crate::router::best_candidate;

/// Routes to an LLM-chosen target: `params.targetAssistant`, or, when
/// `params.fromContext` is true, `ctx.context[params.contextKey ||
/// 'routeTarget']` (a string or `{assistant|target|key}`) (spec §4.6).
pub struct AssistantRouteHandler;

#[async_trait]
impl ActionHandler for AssistantRouteHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(target) = resolve_target(params, run) else {
            return Ok(ActionResult::failed("assistant.route", "no routable target in params or context", 0));
        };
        let reason = params.get("reason").and_then(Value::as_str).map(str::to_string);
        route(run, &target, reason, "assistant.route").await
    }
}

fn resolve_target(params: &Map<String, Value>, run: &ActionRun<'_>) -> Option<String> {
    if let Some(target) = params.get("targetAssistant").and_then(Value::as_str) {
        return Some(target.to_string());
    }
    if !params.get("fromContext").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    let context_key = params.get("contextKey").and_then(Value::as_str).unwrap_or("routeTarget");
    match run.ctx.context.get(context_key)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => ["assistant", "target", "key"].iter().find_map(|k| obj.get(*k)).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Routes to whichever of `params.candidates` is most similar to
/// `params.query` by embedding cosine similarity (spec §4.6, §6 routing
/// config's `confidenceThreshold`/`similarityThreshold`).
pub struct EmbeddingRouteHandler;

#[async_trait]
impl ActionHandler for EmbeddingRouteHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(query) = params.get("query").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("embedding.route", "params.query must be a string", 0));
        };
        let Some(candidate_names) = params.get("candidates").and_then(Value::as_array) else {
            return Ok(ActionResult::failed("embedding.route", "params.candidates must be an array", 0));
        };
        let candidate_names: Vec<String> = candidate_names.iter().filter_map(Value::as_str).map(str::to_string).collect();
        if candidate_names.is_empty() {
            return Ok(ActionResult::failed("embedding.route", "params.candidates must be non-empty", 0));
        }

        let mut texts = vec![query.to_string()];
        texts.extend(candidate_names.iter().cloned());
        let vectors = match super::embedding::embed_texts(run, &texts).await {
            Ok(v) => v,
            Err(err) => return Ok(ActionResult::failed("embedding.route", err.to_string(), 0)),
        };

        let query_vector = &vectors[0];
        let candidates: Vec<(String, Vec<f32>)> = candidate_names.into_iter().zip(vectors[1..].iter().cloned()).collect();
        let Some((target, score)) = best_candidate(query_vector, &candidates) else {
            return Ok(ActionResult::failed("embedding.route", "no candidates to score", 0));
        };

        let similarity_threshold = run.ctx.llm_config.routing.similarity_threshold;
        if f64::from(score) < similarity_threshold {
            if !should_use_llm_fallback(&run.ctx.llm_config, Some(f64::from(score))) {
                return Ok(ActionResult::failed(
                    "embedding.route",
                    format!("best match '{target}' scored {score} below threshold {similarity_threshold}"),
                    0,
                ));
            }
            return llm_fallback_route(run, query, &candidates, score).await;
        }

        let target = target.to_string();
        route(run, &target, Some(format!("embedding similarity {score:.4}")), "embedding.route").await
    }
}

/// When the best embedding candidate scores below `similarityThreshold` and
/// the resolved routing strategy permits it, ask the LLM to pick among the
/// same candidates instead of failing outright (spec §4.1's
/// `should_use_llm_fallback`, §4.6's `embedding.route` fallback clause).
async fn llm_fallback_route(
    run: &mut ActionRun<'_>,
    query: &str,
    candidates: &[(String, Vec<f32>)],
    similarity: f32,
) -> Result<ActionResult, TokenAuthError> {
    let candidate_names: Vec<&str> = candidates.iter().map(|(name, _)| name.as_str()).collect();
    let call = run.state.call_context(&run.ctx.org_id, &run.deps.service_id, None);
    let request = LlmInvokeRequest {
        provider: run.ctx.llm_config.provider.provider.clone(),
        model: run.ctx.llm_config.provider.model.clone(),
        operation: "chat.completions".to_string(),
        params: Map::from_iter([
            (
                "prompt".into(),
                json!(format!(
                    "Choose the single best matching assistant for the query \"{query}\" from this list: {}. Respond with only the chosen name.",
                    candidate_names.join(", ")
                )),
            ),
            ("candidates".into(), json!(candidate_names)),
        ]),
        timeout: 45_000,
    };

    match run.deps.collaborators.integrations.invoke_llm(&call, &request).await {
        Ok(response) => {
            let chosen = response.content.as_str().unwrap_or("").trim();
            let Some(target) = candidate_names.iter().find(|name| name.eq_ignore_ascii_case(chosen)) else {
                return Ok(ActionResult::failed(
                    "embedding.route",
                    format!("llm fallback returned unrecognized candidate '{chosen}'"),
                    0,
                ));
            };
            route(
                run,
                target,
                Some(format!("llm fallback (embedding similarity {similarity:.4} below threshold)")),
                "embedding.route",
            )
            .await
        }
        Err(err) => Ok(ActionResult::failed("embedding.route", err.to_string(), 0)),
    }
}

async fn route(run: &mut ActionRun<'_>, target: &str, reason: Option<String>, action_type: &str) -> Result<ActionResult, TokenAuthError> {
    let Some(message) = &run.ctx.message else {
        return Ok(ActionResult::failed(action_type, "no inbound message to route", 0));
    };
    let call = run.state.call_context(&run.ctx.org_id, &run.deps.service_id, None);
    match run
        .deps
        .router
        .route_downstream(target, reason, &run.ctx.assistant_key, message, &run.ctx.conversation_id, &call)
        .await
    {
        Ok(outcome) => {
            // A successful route suppresses this assistant's own reply for
            // the remainder of the run (spec §4.6 step 4).
            run.state.suppress_response = true;
            Ok(ActionResult::ok(
                action_type,
                Some(json!({ "targetAssistant": outcome.target_assistant, "reason": outcome.reason })),
                0,
            ))
        }
        Err(err) => Ok(ActionResult::failed(action_type, err.to_string(), 0)),
    }
}
