//! Messaging collaborator client (spec §6 "Messaging HTTP surface
//! consumed").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::model::Message;

use super::callctx::CallContext;

/// A `control` event posted to a conversation (spec §6 egress schema).
#[derive(Debug, Clone, Serialize)]
pub struct ControlEvent {
    pub event: String,
    pub conversation_id: String,
    pub target: Option<String>,
    pub reason: Option<String>,
    pub preempted_by: Option<String>,
    pub run_id: Option<String>,
    pub trace_id: Option<String>,
    pub effective_at: String,
}

#[derive(Debug, Deserialize)]
struct JoinResponse {
    #[serde(default)]
    already_joined: bool,
}

/// Consumed surface of the Messaging service.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// `POST /api/conversations/:id/join`, impersonating `as_user_id` via
    /// `X-As-User-Id`. Already-joined is treated as success, not an error
    /// (spec §4.6 step 2: "already-joined is a benign error").
    async fn join_conversation(&self, call: &CallContext, conversation_id: &str) -> Result<(), ActionError>;

    /// `POST /api/conversations/:id/messages`. Idempotent on `message.id`
    /// (server upserts on conflict).
    async fn send_message(&self, call: &CallContext, conversation_id: &str, message: &Message) -> Result<(), ActionError>;

    /// `POST /api/conversations/:id/control`.
    async fn post_control(&self, call: &CallContext, conversation_id: &str, event: &ControlEvent) -> Result<(), ActionError>;
}

/// Real HTTP-backed [`MessagingClient`].
pub struct HttpMessagingClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpMessagingClient {
    /// Build a client against the Messaging service's base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

fn map_status(status: reqwest::StatusCode) -> Option<ActionError> {
    if status.is_success() {
        None
    } else if status == reqwest::StatusCode::UNAUTHORIZED {
        Some(ActionError::Auth("messaging rejected credentials".to_string()))
    } else if status.is_server_error() {
        Some(ActionError::Network(format!("messaging returned {status}")))
    } else {
        Some(ActionError::Validation(format!("messaging rejected request: {status}")))
    }
}

#[async_trait]
impl MessagingClient for HttpMessagingClient {
    #[tracing::instrument(level = "debug", skip(self, call))]
    async fn join_conversation(&self, call: &CallContext, conversation_id: &str) -> Result<(), ActionError> {
        let url = format!("{}/api/conversations/{conversation_id}/join", self.base_url);
        let response = self
            .http
            .post(url)
            .headers(call.headers())
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }
        if let Some(err) = map_status(response.status()) {
            return Err(err);
        }
        let joined: JoinResponse = response.json().await.unwrap_or(JoinResponse { already_joined: true });
        let _ = joined.already_joined;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, call, message))]
    async fn send_message(&self, call: &CallContext, conversation_id: &str, message: &Message) -> Result<(), ActionError> {
        let url = format!("{}/api/conversations/{conversation_id}/messages", self.base_url);
        let body = serde_json::to_value(message).map_err(|err| ActionError::Internal(err.to_string()))?;
        let response = self
            .http
            .post(url)
            .headers(call.headers())
            .json(&body)
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;
        match map_status(response.status()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, call, event))]
    async fn post_control(&self, call: &CallContext, conversation_id: &str, event: &ControlEvent) -> Result<(), ActionError> {
        let url = format!("{}/api/conversations/{conversation_id}/control", self.base_url);
        let response = self
            .http
            .post(url)
            .headers(call.headers())
            .json(event)
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;
        match map_status(response.status()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
