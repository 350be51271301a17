//! `embedding.create` / `embedding.search` (spec §4.3).

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::action::{ActionHandler, ActionRun};
use crate::collaborators::EmbeddingRequest;
use crate::error::{ActionError, TokenAuthError};
use crate::model::ActionResult;
use crate::router::cosine_similarity;

/// Fetch embeddings for `texts`, serving any cache hit from the process-local
/// LRU first and only calling out for the misses (spec §4.3: "if
/// `cacheEmbeddings` is set, embeddings for identical text+model keys must
/// hit a process-local LRU... with O(1) get/put").
pub(super) async fn embed_texts(run: &ActionRun<'_>, texts: &[String]) -> Result<Vec<Vec<f32>>, ActionError> {
    let embedding_cfg = &run.ctx.llm_config.embedding;
    let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
    let mut misses = Vec::new();

    if embedding_cfg.cache_embeddings {
        let mut cache = run.deps.embedding_cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (i, text) in texts.iter().enumerate() {
            let key = cache_key(&embedding_cfg.model, text);
            if let Some(vector) = cache.get(&key) {
                results[i] = Some(vector.clone());
            } else {
                misses.push(i);
            }
        }
    } else {
        misses.extend(0..texts.len());
    }

    if !misses.is_empty() {
        let call = run.state.call_context(&run.ctx.org_id, &run.deps.service_id, None);
        let request = EmbeddingRequest {
            provider: embedding_cfg.provider.clone(),
            model: embedding_cfg.model.clone(),
            input: misses.iter().map(|&i| texts[i].clone()).collect(),
        };
        let response = run.deps.collaborators.integrations.create_embeddings(&call, &request).await?;
        if response.embeddings.len() != misses.len() {
            return Err(ActionError::Internal("embedding response length mismatch".to_string()));
        }
        if embedding_cfg.cache_embeddings {
            let mut cache = run.deps.embedding_cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            for (&i, vector) in misses.iter().zip(&response.embeddings) {
                cache.put(cache_key(&embedding_cfg.model, &texts[i]), vector.clone());
            }
        }
        for (&i, vector) in misses.iter().zip(response.embeddings) {
            results[i] = Some(vector);
        }
    }

    Ok(results.into_iter().map(|v| v.unwrap_or_default()).collect())
}

fn cache_key(model: &str, text: &str) -> String {
    format!("{model}\u{1f}{text}")
}

pub struct EmbeddingCreateHandler;

#[async_trait]
impl ActionHandler for EmbeddingCreateHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let texts = extract_texts(params);
        if texts.is_empty() {
            return Ok(ActionResult::failed("embedding.create", "params must include 'text' or 'texts'", 0));
        }
        match embed_texts(run, &texts).await {
            Ok(embeddings) => Ok(ActionResult::ok("embedding.create", Some(json!({ "embeddings": embeddings })), 0)),
            Err(err) => Ok(ActionResult::failed("embedding.create", err.to_string(), 0)),
        }
    }
}

pub struct EmbeddingSearchHandler;

#[async_trait]
impl ActionHandler for EmbeddingSearchHandler {
    async fn execute(&self, params: &Map<String, Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let Some(query) = params.get("query").and_then(Value::as_str) else {
            return Ok(ActionResult::failed("embedding.search", "params.query must be a string", 0));
        };
        let Some(candidates) = params.get("candidates").and_then(Value::as_array) else {
            return Ok(ActionResult::failed("embedding.search", "params.candidates must be an array", 0));
        };

        let mut ids = Vec::with_capacity(candidates.len());
        let mut texts = vec![query.to_string()];
        for candidate in candidates {
            let (Some(id), Some(text)) = (
                candidate.get("id").and_then(Value::as_str),
                candidate.get("text").and_then(Value::as_str),
            ) else {
                return Ok(ActionResult::failed("embedding.search", "each candidate needs 'id' and 'text'", 0));
            };
            ids.push(id.to_string());
            texts.push(text.to_string());
        }

        let vectors = match embed_texts(run, &texts).await {
            Ok(v) => v,
            Err(err) => return Ok(ActionResult::failed("embedding.search", err.to_string(), 0)),
        };
        let query_vector = &vectors[0];
        let mut ranked: Vec<(String, f32)> = ids
            .into_iter()
            .zip(&vectors[1..])
            .map(|(id, vector)| (id, cosine_similarity(query_vector, vector)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let output: Vec<Value> = ranked.into_iter().map(|(id, score)| json!({ "id": id, "score": score })).collect();
        Ok(ActionResult::ok("embedding.search", Some(json!({ "results": output })), 0))
    }
}

fn extract_texts(params: &Map<String, Value>) -> Vec<String> {
    if let Some(text) = params.get("text").and_then(Value::as_str) {
        return vec![text.to_string()];
    }
    params
        .get("texts")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}
