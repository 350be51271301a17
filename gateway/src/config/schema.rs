//! Process configuration schema for the assistants gateway (spec §6
//! "Configuration").
//!
//! This is the gateway's own process config — service endpoints, alias map,
//! default preset, mailbox/cache sizing, webhook fallback — distinct from
//! `engine::config`'s per-assistant LLM profile resolution (C1). Secrets
//! never round-trip through this struct: the agent credential is always read
//! from the environment (spec §6: "Credentials always loaded from
//! environment, never from source") and kept out of `Serialize`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::util::DEFAULT_AGENT_CREDENTIAL_ENV;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Collaborator service endpoints (spec §6 consumed HTTP surfaces).
    #[serde(default)]
    pub services: ServiceEndpoints,

    /// Assistant routing settings (spec §4.6).
    #[serde(default)]
    pub routing: RoutingConfig,

    /// LLM profile resolution defaults (spec §4.1).
    #[serde(default)]
    pub llm: LlmConfig,

    /// Concurrency/resource sizing (spec §5).
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Ingress HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Agent credential for outbound calls, always sourced from the
    /// environment via [`GatewayConfig::with_env`]; never read from or
    /// written to the TOML file.
    #[serde(skip)]
    pub agent_credential: Option<String>,
}

/// Base URLs for the four external collaborators (spec §1, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// Identity's base URL (`/api/auth/introspect`).
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    /// Catalog's base URL (assistant records, webhook URLs).
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    /// Messaging's base URL (join/send/control).
    #[serde(default = "default_messaging_url")]
    pub messaging_url: String,
    /// Integrations' base URL (`llm.invoke`, `embedding.create`).
    #[serde(default = "default_integrations_url")]
    pub integrations_url: String,
}

fn default_identity_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_catalog_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_messaging_url() -> String {
    "http://localhost:8083".to_string()
}

fn default_integrations_url() -> String {
    "http://localhost:8084".to_string()
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            identity_url: default_identity_url(),
            catalog_url: default_catalog_url(),
            messaging_url: default_messaging_url(),
            integrations_url: default_integrations_url(),
        }
    }
}

/// Assistant routing configuration (spec §4.6 "Normalization", §9 Open
/// Question 3: "the alias map is configuration, not contract").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Short alias → canonical assistant key (e.g. `"logs" -> "log-analyst"`).
    /// Empty means fall back to [`engine::router::AliasMap::default`].
    #[serde(default)]
    pub alias_map: HashMap<String, String>,

    /// Fallback timeout, in milliseconds, for the direct HTTP webhook path
    /// used when the mesh declines a route (spec §4.6 step 3, default 5s).
    #[serde(default = "default_webhook_timeout_ms")]
    pub webhook_timeout_ms: u64,

    /// Identity this service presents as `X-Service-Id` on outbound calls
    /// (spec §6 "Headers propagated").
    #[serde(default = "default_service_id")]
    pub service_id: String,
}

const fn default_webhook_timeout_ms() -> u64 {
    5_000
}

fn default_service_id() -> String {
    "assistants-gateway".to_string()
}

/// LLM profile resolution defaults (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Preset applied when a rule's `config_ref` names none
    /// (`None` means defaults only).
    #[serde(default)]
    pub default_preset: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { default_preset: None }
    }
}

/// Concurrency/resource sizing (spec §5 "Concurrency & Resource Model").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Per-conversation mailbox bound (spec §5 "Backpressure", default 256).
    #[serde(default = "default_mailbox_depth")]
    pub mailbox_depth: usize,

    /// Capacity of the embedding similarity cache (spec §9, minimum 1024).
    #[serde(default = "default_embedding_cache_size")]
    pub embedding_cache_size: usize,

    /// Per-run deadline in milliseconds, enforced by the coordinator's
    /// cancellation token (spec §5 "Cancellation & timeouts").
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,
}

const fn default_mailbox_depth() -> usize {
    256
}

const fn default_embedding_cache_size() -> usize {
    1024
}

const fn default_run_timeout_ms() -> u64 {
    30_000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            mailbox_depth: default_mailbox_depth(),
            embedding_cache_size: default_embedding_cache_size(),
            run_timeout_ms: default_run_timeout_ms(),
        }
    }
}

/// Ingress HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the axum router binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Default webhook fallback URL for this process's own assistant, used
    /// when no per-assistant webhook is recorded in Catalog.
    #[serde(default)]
    pub webhook_fallback_url: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            webhook_fallback_url: None,
        }
    }
}

impl GatewayConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.limits.mailbox_depth == 0 {
            issues.push(ConfigIssue::error("limits.mailboxDepth", "mailbox depth must be at least 1"));
        }
        if self.limits.embedding_cache_size == 0 {
            issues.push(ConfigIssue::warning(
                "limits.embeddingCacheSize",
                "embedding cache size is 0, similarity routing will never hit cache",
            ));
        }
        if self.limits.run_timeout_ms == 0 {
            issues.push(ConfigIssue::error("limits.runTimeoutMs", "run timeout must be at least 1ms"));
        }
        if self.agent_credential.is_none() {
            issues.push(ConfigIssue::warning(
                "agentCredential",
                format!("no agent credential in environment ({DEFAULT_AGENT_CREDENTIAL_ENV}); outbound calls will be unauthenticated"),
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().iter().all(|issue| issue.level != IssueLevel::Error)
    }

    /// Merge environment variables into the configuration. Endpoint and
    /// sizing fields honour `ASSISTANTS_GATEWAY_*` overrides; the agent
    /// credential is read exclusively from the environment (spec §6).
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("ASSISTANTS_GATEWAY_IDENTITY_URL") {
            self.services.identity_url = url;
        }
        if let Ok(url) = std::env::var("ASSISTANTS_GATEWAY_CATALOG_URL") {
            self.services.catalog_url = url;
        }
        if let Ok(url) = std::env::var("ASSISTANTS_GATEWAY_MESSAGING_URL") {
            self.services.messaging_url = url;
        }
        if let Ok(url) = std::env::var("ASSISTANTS_GATEWAY_INTEGRATIONS_URL") {
            self.services.integrations_url = url;
        }
        if let Ok(addr) = std::env::var("ASSISTANTS_GATEWAY_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Ok(depth) = std::env::var("ASSISTANTS_GATEWAY_MAILBOX_DEPTH")
            && let Ok(depth) = depth.parse()
        {
            self.limits.mailbox_depth = depth;
        }

        self.agent_credential = std::env::var(DEFAULT_AGENT_CREDENTIAL_ENV).ok();
        self
    }
}

/// Configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., `"limits.mailboxDepth"`).
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", prefix, self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Error that prevents the gateway from running correctly.
    Error,
    /// Warning about potential issues.
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.limits.mailbox_depth, 256);
        assert_eq!(config.limits.embedding_cache_size, 1024);
        assert!(config.llm.default_preset.is_none());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = GatewayConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("agent_credential"));
        let parsed: GatewayConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.services.identity_url, config.services.identity_url);
    }

    #[test]
    fn test_parse_sample_config() {
        let toml_str = r#"
[services]
identity_url = "https://identity.internal"

[routing.alias_map]
logs = "log-analyst"

[limits]
mailbox_depth = 64
"#;
        let config: GatewayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.services.identity_url, "https://identity.internal");
        assert_eq!(config.routing.alias_map.get("logs"), Some(&"log-analyst".to_string()));
        assert_eq!(config.limits.mailbox_depth, 64);
    }

    #[test]
    fn test_validation_zero_mailbox_depth() {
        let mut config = GatewayConfig::default();
        config.limits.mailbox_depth = 0;
        let issues = config.validate();
        assert!(!config.is_valid());
        assert!(issues.iter().any(|i| i.level == IssueLevel::Error));
    }

    #[test]
    fn test_credential_never_serialized() {
        let mut config = GatewayConfig::default();
        config.agent_credential = Some("super-secret".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("super-secret"));
    }
}
