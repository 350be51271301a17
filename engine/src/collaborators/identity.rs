//! Identity collaborator client (spec §6 "Identity dependency").

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ActionError, TokenAuthError};

use super::callctx::CallContext;

/// `user` or `agent`, as returned by token introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalType {
    User,
    Agent,
}

/// The validated envelope Identity returns for an active token.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectResponse {
    pub active: bool,
    pub sub: Option<String>,
    #[serde(rename = "type")]
    pub principal_type: Option<PrincipalType>,
    pub org_id: Option<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub entitlements: Vec<String>,
    #[serde(default)]
    pub is_super_admin: bool,
}

/// Consumed surface of the Identity service: token introspection only — the
/// core never issues tokens (spec §1 Non-goals).
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// `POST /api/auth/introspect {token}`. Returns
    /// [`ActionError::Auth`]/[`TokenAuthError`] are not raised here directly —
    /// callers inspect `active` and raise `TokenAuthError` themselves, since
    /// only some call sites (actions mid-run) treat an inactive token as the
    /// distinguished propagating error.
    async fn introspect(&self, token: &str) -> Result<IntrospectResponse, ActionError>;
}

/// Real HTTP-backed [`IdentityClient`].
pub struct HttpIdentityClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpIdentityClient {
    /// Build a client against the Identity service's base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    #[tracing::instrument(level = "debug", skip(self, token))]
    async fn introspect(&self, token: &str) -> Result<IntrospectResponse, ActionError> {
        let url = format!("{}/api/auth/introspect", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|err| ActionError::Network(err.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ActionError::Auth("token rejected by identity service".to_string()));
        }
        if !response.status().is_success() {
            return Err(ActionError::Network(format!("identity introspect returned {}", response.status())));
        }
        response
            .json()
            .await
            .map_err(|err| ActionError::Internal(format!("malformed introspect response: {err}")))
    }
}

/// Raise the distinguished [`TokenAuthError`] when an introspection result
/// says the token is inactive. Call sites that are mid-action (not a
/// dedicated identity check) use this to convert `active=false` into the
/// error that escapes the rule engine (spec §6, §7).
pub fn require_active(response: &IntrospectResponse, token: &str) -> Result<(), TokenAuthError> {
    if response.active {
        Ok(())
    } else {
        Err(TokenAuthError(format!("token '{token}' is not active")))
    }
}
