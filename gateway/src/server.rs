//! Ingress HTTP surface: `message.new` delivery, the webhook fallback
//! receiver, and a health endpoint (spec §6, SPEC_FULL.md [SUPPLEMENT] item
//! 3). spec.md scopes a full HTTP front-end (routing, CORS, cookies) out;
//! this is the minimal binding the engine needs to run as a standalone
//! process.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router as AxumRouter};
use serde::Deserialize;
use serde_json::{json, Map};

use engine::model::{Message, ResolvedLlmConfig, Trigger};
use engine::run::{InboundEvent, RunCoordinator};

/// Shared state handed to every route.
pub struct AppState {
    pub coordinator: Arc<RunCoordinator>,
    /// LLM profile used when a rule set's own `config_ref` resolution hasn't
    /// happened yet (C1 still runs per-action; this just seeds
    /// `ExecutionContext.llmConfig`).
    pub default_llm_config: ResolvedLlmConfig,
}

/// Build the axum router: ingress `message.new`, the webhook fallback
/// receiver, and `/healthz`.
pub fn router(state: Arc<AppState>) -> AxumRouter {
    AxumRouter::new()
        .route("/healthz", get(healthz))
        .route("/events/message-new", post(message_new))
        .route("/webhooks/{assistant_key}", post(webhook_fallback))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// One entry of the ingress envelope's `assistants` list (spec §6 ingress
/// schema: `{ userId, key, entityId? }`); only `key` drives fan-out, the
/// rest of the wire schema is accepted and ignored.
#[derive(Debug, Deserialize)]
struct AssistantRef {
    key: String,
}

/// Ingress `message.new` envelope (spec §6).
#[derive(Debug, Deserialize)]
struct MessageNewRequest {
    conversation_id: String,
    message: Message,
    #[serde(default)]
    assistants: Vec<AssistantRef>,
    #[serde(default)]
    org_id: Option<String>,
}

/// Receive a `message.new` event and fan it out to every listed assistant's
/// Run Coordinator (spec §1 "Data flow": "an incoming message... fans out as
/// an event to each assistant's Run Coordinator"). Runs are dispatched
/// concurrently; each serializes internally per `conversationId` through the
/// coordinator's mailbox.
async fn message_new(State(state): State<Arc<AppState>>, Json(body): Json<MessageNewRequest>) -> impl IntoResponse {
    if body.assistants.is_empty() {
        return (StatusCode::ACCEPTED, Json(json!({"accepted": 0})));
    }

    let org_id = body.org_id.clone().unwrap_or_default();
    let accepted = body.assistants.len();
    for assistant in body.assistants {
        let coordinator = state.coordinator.clone();
        let event = InboundEvent {
            org_id: org_id.clone(),
            conversation_id: body.conversation_id.clone(),
            assistant_key: assistant.key,
            trigger: Trigger::MessageReceived,
            message: Some(body.message.clone()),
            user: None,
            llm_config: state.default_llm_config.clone(),
            trace_id: None,
            event_data: Map::new(),
        };
        tokio::spawn(async move {
            if let Err(err) = coordinator.process_event(event).await {
                tracing::error!(error = %err, "run failed");
            }
        });
    }

    (StatusCode::ACCEPTED, Json(json!({"accepted": accepted})))
}

/// Body shape the router's webhook fallback path POSTs (spec §4.6 step 3,
/// `engine::router::MeshEnvelope`, minus the fields this receiver doesn't
/// need).
#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    conversation_id: String,
    message: Message,
}

/// Receive a routed message via the direct webhook fallback path, for an
/// assistant hosted on this process (spec §4.6: "on null result, fall back
/// to direct HTTP webhooks to each assistant's webhook URL").
async fn webhook_fallback(
    State(state): State<Arc<AppState>>,
    Path(assistant_key): Path<String>,
    Json(body): Json<WebhookEnvelope>,
) -> impl IntoResponse {
    let event = InboundEvent {
        org_id: String::new(),
        conversation_id: body.conversation_id,
        assistant_key,
        trigger: Trigger::MessageReceived,
        message: Some(body.message),
        user: None,
        llm_config: state.default_llm_config.clone(),
        trace_id: None,
        event_data: Map::new(),
    };

    match state.coordinator.process_event(event).await {
        Ok(_) => (StatusCode::ACCEPTED, Json(json!({"status": "accepted"}))),
        Err(err) => {
            tracing::error!(error = %err, "webhook-delivered run failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": err.to_string()})))
        }
    }
}
