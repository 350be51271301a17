//! The resolved LLM profile produced by the configuration resolver (C1).
//!
//! Spec §9's design note calls for "known sections... get explicit merge
//! functions; no generic reflective merge." Each section below is a
//! dedicated struct so [`crate::config::merge`] can dispatch per-section
//! instead of walking an untyped tree.

use serde::{Deserialize, Serialize};

/// Text truncation strategy for context window management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Drop oldest messages first.
    SlidingWindow,
    /// Summarize dropped content instead of discarding it.
    Summarization,
    /// Never truncate; fail instead.
    None,
}

/// Response format hint for the LLM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text.
    Text,
    /// Structured JSON.
    Json,
}

/// Generation parameters (spec §4.1 presets: temperature, format, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Desired response format.
    pub response_format: ResponseFormat,
}

/// Provider/model selection and fallback behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSelectionConfig {
    /// Primary provider name, e.g. `openai`, `anthropic`.
    pub provider: String,
    /// Primary model name.
    pub model: String,
    /// Whether the Integrations collaborator may fall back to an alternate
    /// provider/model on failure.
    pub allow_fallback: bool,
}

/// Embedding-specific profile used by `embedding.*` actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider name.
    pub provider: String,
    /// Embedding model name.
    pub model: String,
    /// Whether identical (text, model) pairs should be served from the
    /// process-local LRU (spec §4.3).
    pub cache_embeddings: bool,
}

/// Routing strategy for `assistant.route` / `embedding.route`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// Rules/alias-map only, never embeddings or an LLM call.
    Rules,
    /// Embedding similarity only.
    Embedding,
    /// LLM-chosen target.
    Llm,
    /// Embedding first, LLM fallback below the confidence threshold.
    Hybrid,
}

/// Routing configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// The active strategy.
    pub strategy: RoutingStrategy,
    /// Minimum cosine similarity to accept an embedding match outright.
    pub similarity_threshold: f64,
    /// For `hybrid`: the similarity below which the LLM fallback fires
    /// (spec §4.1 `should_use_llm_fallback`).
    pub confidence_threshold: f64,
}

/// Content-safety toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Whether to request provider-side content moderation.
    pub moderation_enabled: bool,
}

/// Reliability knobs applied to outbound collaborator calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Per-action call timeout.
    pub timeout_ms: u64,
    /// Maximum retry attempts on network/5xx failures.
    pub max_retries: u32,
    /// Initial backoff delay before the first retry.
    pub initial_backoff_ms: u64,
}

/// Context-window management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextWindowConfig {
    /// Maximum context window, in tokens.
    pub max_context_tokens: u32,
    /// Truncation strategy applied once the window is exceeded.
    pub truncation: TruncationStrategy,
}

/// Observability toggles for this profile (tracing is always on regardless;
/// this only governs provider-side usage/telemetry reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Whether to request token-usage accounting from the provider.
    pub track_usage: bool,
}

/// The fully-populated profile produced by [`crate::config::resolve`].
///
/// Every field is always present after resolution (spec §3 "Resolved LLM
/// Profile").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// Generation parameters.
    pub generation: GenerationConfig,
    /// Provider/model selection.
    pub provider: ProviderSelectionConfig,
    /// Embedding profile.
    pub embedding: EmbeddingConfig,
    /// Routing strategy.
    pub routing: RoutingConfig,
    /// Safety toggles.
    pub safety: SafetyConfig,
    /// Reliability knobs.
    pub reliability: ReliabilityConfig,
    /// Context window management.
    pub context: ContextWindowConfig,
    /// Observability toggles.
    pub observability: ObservabilityConfig,
}
