//! Catalog collaborator client (spec §1: "Catalog storage of resource
//! versions, artifacts, signatures" — out of scope; the core only needs to
//! resolve an assistant key to its webhook URL and existence for routing).

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ActionError;

/// The subset of a Catalog assistant record the router needs to validate and
/// address a routing target (spec §4.6 "Target assistant not found in
/// catalog").
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRecord {
    pub key: String,
    pub entity_id: String,
    pub webhook_url: Option<String>,
}

/// Consumed surface of the Catalog service.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Resolve an assistant by its `<alias>` key. `Ok(None)` when the
    /// assistant does not exist in the catalog.
    async fn get_assistant(&self, key: &str) -> Result<Option<AssistantRecord>, ActionError>;
}

/// Real HTTP-backed [`CatalogClient`].
pub struct HttpCatalogClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpCatalogClient {
    /// Build a client against the Catalog service's base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_assistant(&self, key: &str) -> Result<Option<AssistantRecord>, ActionError> {
        let url = format!("{}/api/assistants/{key}", self.base_url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ActionError::Network(format!("catalog lookup returned {}", response.status())));
        }
        response
            .json()
            .await
            .map(Some)
            .map_err(|err| ActionError::Internal(format!("malformed catalog response: {err}")))
    }
}
