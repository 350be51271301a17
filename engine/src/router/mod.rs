//! C6 — Assistant Router & Event Bus Client (spec §4.6).
//!
//! `assistant.route` and `embedding.route` share this module's downstream
//! effect; only their target-selection policy differs (implemented in
//! `engine::action::handlers::routing`).

mod alias;
mod eventbus;
mod similarity;

pub use alias::AliasMap;
pub use eventbus::{EventBus, MeshEnvelope, NullEventBus};
pub use similarity::{best_candidate, cosine_similarity};

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::json;

use crate::collaborators::{CallContext, CatalogClient, CircuitBreaker, MessagingClient};
use crate::error::ActionError;
use crate::model::Message;
use crate::registry::RuleSetRegistry;

/// Default webhook fallback timeout (spec §4.6 step 3).
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of a successful route, returned to the calling action
/// handler so it can shape `ActionResult.output` per spec §4.6 step 4.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub target_assistant: String,
    pub reason: Option<String>,
}

/// C6: resolves and carries out the downstream effect of a routing
/// decision. Selection policy (`assistant.route` vs `embedding.route`) lives
/// one layer up, in the action handlers that call [`Router::route_downstream`].
pub struct Router {
    alias_map: AliasMap,
    registry: Arc<RuleSetRegistry>,
    catalog: Arc<dyn CatalogClient>,
    messaging: Arc<dyn MessagingClient>,
    event_bus: Arc<dyn EventBus>,
    http: reqwest::Client,
    webhook_timeout: Duration,
    webhook_breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl Router {
    /// Build a router over the given alias map, rule set registry, and
    /// collaborators. Defaults to [`NullEventBus`] (webhook-only) until a
    /// real mesh client is wired in.
    #[must_use]
    pub fn new(
        alias_map: AliasMap,
        registry: Arc<RuleSetRegistry>,
        catalog: Arc<dyn CatalogClient>,
        messaging: Arc<dyn MessagingClient>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            alias_map,
            registry,
            catalog,
            messaging,
            event_bus: Arc::new(NullEventBus),
            http,
            webhook_timeout: DEFAULT_WEBHOOK_TIMEOUT,
            webhook_breakers: DashMap::new(),
        }
    }

    /// Swap in a real mesh client.
    #[must_use]
    pub fn with_event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Normalize a raw target name (spec §4.6 "Normalization").
    #[must_use]
    pub fn normalize(&self, raw_target: &str) -> String {
        self.alias_map.normalize(raw_target)
    }

    /// Whether the rule set registry has anything loaded for `assistant_key`.
    #[must_use]
    pub fn assistant_known(&self, assistant_key: &str) -> bool {
        self.registry.has_assistant(assistant_key)
    }

    /// Carry out the shared downstream effect of a route (spec §4.6 steps
    /// 1–3): verify the target exists, join it to the conversation, and emit
    /// a forwarded `message.new` restricted to that target, falling back to
    /// a webhook when the mesh declines.
    #[tracing::instrument(level = "info", skip(self, message, call), fields(target = raw_target))]
    pub async fn route_downstream(
        &self,
        raw_target: &str,
        reason: Option<String>,
        caller_key: &str,
        message: &Message,
        conversation_id: &str,
        call: &CallContext,
    ) -> Result<RouteOutcome, ActionError> {
        let target = self.alias_map.normalize(raw_target);

        if !self.registry.has_assistant(&target) {
            return Err(ActionError::NotFound(format!("Assistant '{target}' not found")));
        }

        let target_principal = format!("assistant:{target}");
        let join_call = CallContext {
            as_user_id: Some(target_principal.clone()),
            ..call.clone()
        };
        self.messaging.join_conversation(&join_call, conversation_id).await?;

        let mut forwarded = message.clone();
        forwarded.metadata.insert("routedFrom".to_string(), json!(caller_key));
        if let Some(reason) = &reason {
            forwarded.metadata.insert("routeReason".to_string(), json!(reason));
        }

        let envelope = MeshEnvelope::new(conversation_id.to_string(), forwarded, target_principal.clone());
        if self.event_bus.publish(&envelope).await.is_none() {
            self.emit_via_webhook(&target, &envelope).await?;
        }

        tracing::info!(target = %target, "routed message to target assistant");
        Ok(RouteOutcome { target_assistant: target, reason })
    }

    async fn emit_via_webhook(&self, target: &str, envelope: &MeshEnvelope) -> Result<(), ActionError> {
        let record = self
            .catalog
            .get_assistant(target)
            .await?
            .ok_or_else(|| ActionError::NotFound(format!("Assistant '{target}' not found")))?;
        let Some(webhook_url) = record.webhook_url else {
            return Err(ActionError::NotFound(format!("Assistant '{target}' has no webhook fallback URL")));
        };

        let breaker = self.webhook_breakers.entry(target.to_string()).or_insert_with(|| Arc::new(CircuitBreaker::new())).clone();
        if !breaker.allow() {
            return Err(ActionError::Overloaded(format!("webhook circuit open for '{target}'")));
        }

        let result = self.http.post(&webhook_url).timeout(self.webhook_timeout).json(envelope).send().await;
        match result {
            Ok(response) if response.status().is_success() => {
                breaker.record_success();
                Ok(())
            }
            Ok(response) => {
                breaker.record_failure();
                Err(ActionError::Network(format!("webhook '{target}' returned {}", response.status())))
            }
            Err(err) => {
                breaker.record_failure();
                Err(ActionError::Network(format!("webhook '{target}' unreachable: {err}")))
            }
        }
    }
}
