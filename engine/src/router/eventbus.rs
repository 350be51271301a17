//! Event bus contract: the mesh path and the webhook fallback path behind
//! one `emit` function (spec §4.6 step 3, §9 "Webhook fallback path").

use async_trait::async_trait;
use serde::Serialize;

use crate::model::Message;

/// The forwarded `message.new` envelope, restricted to one target
/// (spec §4.6 step 3).
#[derive(Debug, Clone, Serialize)]
pub struct MeshEnvelope {
    pub target: &'static str,
    pub boundary: &'static str,
    pub conversation_id: String,
    pub message: Message,
    pub recipients: Vec<String>,
}

impl MeshEnvelope {
    /// Build the envelope for routing `message` to exactly `target_entity_id`.
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, message: Message, target_entity_id: impl Into<String>) -> Self {
        Self {
            target: "assistants",
            boundary: "intra",
            conversation_id: conversation_id.into(),
            message,
            recipients: vec![target_entity_id.into()],
        }
    }
}

/// The intra-mesh publish path. `Ok(None)` means the mesh declined (or is
/// unavailable) and the caller must fall back to the webhook path; this
/// mirrors the source's "on null result" fallback trigger.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, envelope: &MeshEnvelope) -> Option<()>;
}

/// A mesh client that never delivers — every call falls through to the
/// webhook path. This is the standalone-deployment default: spec §1 scopes
/// the actual SDN mesh transport out as an external collaborator, so until
/// one is wired in, routing relies entirely on the webhook compatibility
/// shim spec §9 calls out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventBus;

#[async_trait]
impl EventBus for NullEventBus {
    async fn publish(&self, _envelope: &MeshEnvelope) -> Option<()> {
        None
    }
}
