//! Integrations collaborator client (spec §6 "Integrations HTTP surface
//! consumed").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ActionError;

use super::callctx::CallContext;

/// Normalized finish reason (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    Incomplete,
}

/// Request body for `llm.invoke` → `POST /api/invoke`.
#[derive(Debug, Clone, Serialize)]
pub struct LlmInvokeRequest {
    pub provider: String,
    pub model: String,
    pub operation: String,
    pub params: Map<String, Value>,
    pub timeout: u64,
}

/// Normalized response from `POST /api/invoke`.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmInvokeResponse {
    pub provider: String,
    pub model: String,
    pub content: Value,
    pub usage: Option<Value>,
    pub finish_reason: FinishReason,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Request body for `embedding.create`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub provider: String,
    pub model: String,
    pub input: Vec<String>,
}

/// Response from `embedding.create`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub provider: String,
    pub model: String,
    pub embeddings: Vec<Vec<f32>>,
    pub usage: Option<Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// An arbitrary dotted-namespace call for `integration.invoke`
/// (e.g. `openai.chat.completions`).
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationInvokeRequest {
    pub namespace: String,
    pub params: Map<String, Value>,
    pub timeout: u64,
}

/// Consumed surface of the Integrations service: all provider-specific wire
/// adapters live behind this one normalized contract (spec §1).
#[async_trait]
pub trait IntegrationsClient: Send + Sync {
    /// `llm.invoke` → `POST /api/invoke`.
    async fn invoke_llm(&self, call: &CallContext, request: &LlmInvokeRequest) -> Result<LlmInvokeResponse, ActionError>;

    /// `embedding.create`.
    async fn create_embeddings(&self, call: &CallContext, request: &EmbeddingRequest) -> Result<EmbeddingResponse, ActionError>;

    /// `integration.invoke`, dispatched by dotted namespace.
    async fn invoke_integration(&self, call: &CallContext, request: &IntegrationInvokeRequest) -> Result<Value, ActionError>;
}

/// Real HTTP-backed [`IntegrationsClient`].
pub struct HttpIntegrationsClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpIntegrationsClient {
    /// Build a client against the Integrations service's base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

fn map_status(status: reqwest::StatusCode) -> Option<ActionError> {
    if status.is_success() {
        None
    } else if status == reqwest::StatusCode::UNAUTHORIZED {
        Some(ActionError::Auth("integrations rejected credentials".to_string()))
    } else if status.is_server_error() {
        Some(ActionError::Network(format!("integrations returned {status}")))
    } else {
        Some(ActionError::Validation(format!("integrations rejected request: {status}")))
    }
}

#[async_trait]
impl IntegrationsClient for HttpIntegrationsClient {
    #[tracing::instrument(level = "debug", skip(self, call, request), fields(provider = %request.provider, model = %request.model))]
    async fn invoke_llm(&self, call: &CallContext, request: &LlmInvokeRequest) -> Result<LlmInvokeResponse, ActionError> {
        let url = format!("{}/api/invoke", self.base_url);
        let response = self
            .http
            .post(url)
            .headers(call.headers())
            .json(request)
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;
        if let Some(err) = map_status(response.status()) {
            return Err(err);
        }
        response
            .json()
            .await
            .map_err(|err| ActionError::Internal(format!("malformed invoke response: {err}")))
    }

    #[tracing::instrument(level = "debug", skip(self, call, request), fields(provider = %request.provider, model = %request.model))]
    async fn create_embeddings(&self, call: &CallContext, request: &EmbeddingRequest) -> Result<EmbeddingResponse, ActionError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .http
            .post(url)
            .headers(call.headers())
            .json(request)
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;
        if let Some(err) = map_status(response.status()) {
            return Err(err);
        }
        response
            .json()
            .await
            .map_err(|err| ActionError::Internal(format!("malformed embeddings response: {err}")))
    }

    #[tracing::instrument(level = "debug", skip(self, call, request), fields(namespace = %request.namespace))]
    async fn invoke_integration(&self, call: &CallContext, request: &IntegrationInvokeRequest) -> Result<Value, ActionError> {
        let url = format!("{}/api/integrations/{}", self.base_url, request.namespace);
        let response = self
            .http
            .post(url)
            .headers(call.headers())
            .json(request)
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;
        if let Some(err) = map_status(response.status()) {
            return Err(err);
        }
        response
            .json()
            .await
            .map_err(|err| ActionError::Internal(format!("malformed integration response: {err}")))
    }
}
