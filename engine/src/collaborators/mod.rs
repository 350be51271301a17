//! Thin clients for the four external collaborators spec.md treats as
//! out-of-scope services with only their consumed interface specified
//! (spec §1, §6): Identity, Catalog, Messaging, Integrations.

pub mod callctx;
pub mod catalog;
pub mod circuit_breaker;
pub mod identity;
pub mod integrations;
pub mod messaging;
pub mod mock;

pub use callctx::CallContext;
pub use catalog::{AssistantRecord, CatalogClient, HttpCatalogClient};
pub use circuit_breaker::CircuitBreaker;
pub use identity::{require_active, HttpIdentityClient, IdentityClient, IntrospectResponse, PrincipalType};
pub use integrations::{
    EmbeddingRequest, EmbeddingResponse, FinishReason, HttpIntegrationsClient,
    IntegrationInvokeRequest, IntegrationsClient, LlmInvokeRequest, LlmInvokeResponse,
};
pub use messaging::{ControlEvent, HttpMessagingClient, MessagingClient};

use std::sync::Arc;

/// The full set of collaborator clients a run needs, bundled for
/// convenience so [`crate::run::RunCoordinator`] and action handlers take
/// one argument instead of four (spec §1's collaborator list, assembled).
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityClient>,
    pub catalog: Arc<dyn CatalogClient>,
    pub messaging: Arc<dyn MessagingClient>,
    pub integrations: Arc<dyn IntegrationsClient>,
}

impl Collaborators {
    /// Build a real, HTTP-backed collaborator set.
    #[must_use]
    pub fn http(identity_url: &str, catalog_url: &str, messaging_url: &str, integrations_url: &str, http: reqwest::Client) -> Self {
        Self {
            identity: Arc::new(HttpIdentityClient::new(identity_url, http.clone())),
            catalog: Arc::new(HttpCatalogClient::new(catalog_url, http.clone())),
            messaging: Arc::new(HttpMessagingClient::new(messaging_url, http.clone())),
            integrations: Arc::new(HttpIntegrationsClient::new(integrations_url, http)),
        }
    }
}
