//! Section-shaped overlay types (spec §4.1).
//!
//! `config_ref.overrides`, org defaults, and presets are all expressed as
//! [`ConfigOverrides`] so [`super::merge::apply`] has exactly one merge
//! function per section regardless of where the overlay came from.

use serde::{Deserialize, Serialize};

use crate::model::{ResponseFormat, RoutingStrategy, TruncationStrategy};

/// Overlay for [`crate::model::GenerationConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOverrides {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub response_format: Option<ResponseFormat>,
}

/// Overlay for [`crate::model::ProviderSelectionConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub allow_fallback: Option<bool>,
}

/// Overlay for [`crate::model::EmbeddingConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub cache_embeddings: Option<bool>,
}

/// Overlay for [`crate::model::RoutingConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingOverrides {
    pub strategy: Option<RoutingStrategy>,
    pub similarity_threshold: Option<f64>,
    pub confidence_threshold: Option<f64>,
}

/// Overlay for [`crate::model::SafetyConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyOverrides {
    pub moderation_enabled: Option<bool>,
}

/// Overlay for [`crate::model::ReliabilityConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityOverrides {
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
}

/// Overlay for [`crate::model::ContextWindowConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextOverrides {
    pub max_context_tokens: Option<u32>,
    pub truncation: Option<TruncationStrategy>,
}

/// Overlay for [`crate::model::ObservabilityConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityOverrides {
    pub track_usage: Option<bool>,
}

/// A full overlay, section by section. Every section is independently
/// optional — an overlay only touches the sections it mentions
/// (spec §4.1: "`undefined` is treated as absent").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub generation: Option<GenerationOverrides>,
    pub provider: Option<ProviderOverrides>,
    pub embedding: Option<EmbeddingOverrides>,
    pub routing: Option<RoutingOverrides>,
    pub safety: Option<SafetyOverrides>,
    pub reliability: Option<ReliabilityOverrides>,
    pub context: Option<ContextOverrides>,
    pub observability: Option<ObservabilityOverrides>,
}

/// The caller-supplied reference passed to [`super::resolve`]: an optional
/// named preset plus an optional explicit overlay (spec §4.1 contract).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigRef {
    /// `routing` | `conversational` | `code` | `reasoning` | `custom` | unset.
    /// `"custom"` and unset both mean "no preset overlay".
    pub preset: Option<String>,
    /// Explicit per-assistant/per-request overrides, applied last.
    pub overrides: Option<ConfigOverrides>,
}
