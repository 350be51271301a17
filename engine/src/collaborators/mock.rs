//! In-memory collaborator test doubles (spec §8 scenario tests; this crate's
//! own test tooling, not part of the production call graph).

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;
use crate::model::Message;

use super::callctx::CallContext;
use super::catalog::{AssistantRecord, CatalogClient};
use super::identity::{IdentityClient, IntrospectResponse, PrincipalType};
use super::integrations::{
    EmbeddingRequest, EmbeddingResponse, IntegrationInvokeRequest, IntegrationsClient,
    LlmInvokeRequest, LlmInvokeResponse,
};
use super::messaging::{ControlEvent, MessagingClient};

/// Everything a scenario test observed a mock collaborator do, for
/// assertions after a run.
#[derive(Debug, Default)]
pub struct Recorded {
    pub joined: Vec<String>,
    pub sent_messages: Vec<(String, Message)>,
    pub control_events: Vec<(String, ControlEvent)>,
    pub llm_invocations: Vec<LlmInvokeRequest>,
}

/// A scripted Messaging + Integrations + Catalog + Identity double. Every
/// method succeeds by default; failures are injected by setting the
/// corresponding `fail_*` flag before the run.
pub struct MockCollaborators {
    pub recorded: Mutex<Recorded>,
    pub fail_join: bool,
    pub fail_send: bool,
    pub llm_response: Option<LlmInvokeResponse>,
    pub embedding_response: Option<EmbeddingResponse>,
    pub known_assistants: Mutex<Vec<AssistantRecord>>,
}

impl Default for MockCollaborators {
    fn default() -> Self {
        Self {
            recorded: Mutex::new(Recorded::default()),
            fail_join: false,
            fail_send: false,
            llm_response: None,
            embedding_response: None,
            known_assistants: Mutex::new(Vec::new()),
        }
    }
}

impl MockCollaborators {
    /// Build an empty mock with no scripted failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an assistant as present in the catalog, for routing tests.
    pub fn register_assistant(&self, record: AssistantRecord) {
        self.known_assistants.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(record);
    }
}

#[async_trait]
impl MessagingClient for MockCollaborators {
    async fn join_conversation(&self, _call: &CallContext, conversation_id: &str) -> Result<(), ActionError> {
        if self.fail_join {
            return Err(ActionError::Network("mock join failure".to_string()));
        }
        self.recorded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .joined
            .push(conversation_id.to_string());
        Ok(())
    }

    async fn send_message(&self, _call: &CallContext, conversation_id: &str, message: &Message) -> Result<(), ActionError> {
        if self.fail_send {
            return Err(ActionError::Network("mock send failure".to_string()));
        }
        self.recorded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .sent_messages
            .push((conversation_id.to_string(), message.clone()));
        Ok(())
    }

    async fn post_control(&self, _call: &CallContext, conversation_id: &str, event: &ControlEvent) -> Result<(), ActionError> {
        self.recorded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .control_events
            .push((conversation_id.to_string(), event.clone()));
        Ok(())
    }
}

#[async_trait]
impl IntegrationsClient for MockCollaborators {
    async fn invoke_llm(&self, _call: &CallContext, request: &LlmInvokeRequest) -> Result<LlmInvokeResponse, ActionError> {
        self.recorded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .llm_invocations
            .push(request.clone());
        self.llm_response.clone().ok_or_else(|| ActionError::Internal("no scripted llm response".to_string()))
    }

    async fn create_embeddings(&self, _call: &CallContext, _request: &EmbeddingRequest) -> Result<EmbeddingResponse, ActionError> {
        self.embedding_response
            .clone()
            .ok_or_else(|| ActionError::Internal("no scripted embedding response".to_string()))
    }

    async fn invoke_integration(&self, _call: &CallContext, _request: &IntegrationInvokeRequest) -> Result<Value, ActionError> {
        Ok(Value::Null)
    }
}

#[async_trait]
impl CatalogClient for MockCollaborators {
    async fn get_assistant(&self, key: &str) -> Result<Option<AssistantRecord>, ActionError> {
        Ok(self
            .known_assistants
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .find(|a| a.key == key)
            .cloned())
    }
}

#[async_trait]
impl IdentityClient for MockCollaborators {
    async fn introspect(&self, token: &str) -> Result<IntrospectResponse, ActionError> {
        Ok(IntrospectResponse {
            active: token != "expired",
            sub: Some("test-user".to_string()),
            principal_type: Some(PrincipalType::User),
            org_id: Some("org-1".to_string()),
            organizations: vec!["org-1".to_string()],
            entitlements: Vec::new(),
            is_super_admin: false,
        })
    }
}
