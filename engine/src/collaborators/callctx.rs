//! Shared outbound call context: headers every collaborator call propagates
//! (spec §6 "Headers propagated on all outbound service calls").

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Per-call identity and tracing context threaded through every outbound
/// HTTP request to Identity/Catalog/Messaging/Integrations.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// `X-Org-Id`.
    pub org_id: String,
    /// `X-Service-Id` — this process's own service identity.
    pub service_id: String,
    /// `X-Trace-Id`, when correlating a run/trace.
    pub trace_id: Option<String>,
    /// Bearer token or API key used for `Authorization`.
    pub token: String,
    /// `X-As-User-Id`, for service impersonation of agents
    /// (e.g. `assistant:<alias>` joining a conversation).
    pub as_user_id: Option<String>,
}

impl CallContext {
    /// Build the header set for one outbound request.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        insert(&mut headers, "X-Org-Id", &self.org_id);
        insert(&mut headers, "X-Service-Id", &self.service_id);
        if let Some(trace_id) = &self.trace_id {
            insert(&mut headers, "X-Trace-Id", trace_id);
        }
        insert(&mut headers, "Authorization", &format!("Bearer {}", self.token));
        if let Some(as_user_id) = &self.as_user_id {
            insert(&mut headers, "X-As-User-Id", as_user_id);
        }
        headers
    }
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        headers.insert(name, value);
    }
}
