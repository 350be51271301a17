//! C1 — Configuration Resolver (spec §4.1).
//!
//! Produces a fully-populated [`ResolvedLlmConfig`] by deep-merging, in
//! order: [`defaults::system_defaults`], `org_defaults`, the named preset (if
//! any), then `config_ref.overrides`. Every merge step goes through
//! [`merge::apply`], so the same section-dispatched logic handles all three
//! overlay sources.

mod defaults;
mod merge;
mod overrides;
mod presets;

pub use defaults::system_defaults;
pub use overrides::{
    ConfigOverrides, ConfigRef, ContextOverrides, EmbeddingOverrides, GenerationOverrides,
    ObservabilityOverrides, ProviderOverrides, ReliabilityOverrides, RoutingOverrides,
    SafetyOverrides,
};

use serde_json::{Map, Value};

use crate::model::{ResolvedLlmConfig, ResponseFormat, RoutingStrategy};

/// Resolve an effective LLM profile (spec §4.1 contract).
///
/// `org_defaults` is the organization's own overlay, applied before any
/// preset so a preset can still override an org default — matching the
/// merge order spec §4.1 lists: system defaults, then org defaults, then
/// preset, then explicit per-request overrides.
#[must_use]
#[tracing::instrument(level = "debug", skip_all, fields(preset = config_ref.and_then(|c| c.preset.as_deref())))]
pub fn resolve(config_ref: Option<&ConfigRef>, org_defaults: Option<&ConfigOverrides>) -> ResolvedLlmConfig {
    let mut resolved = system_defaults();

    if let Some(org) = org_defaults {
        merge::apply(&mut resolved, org);
    }

    if let Some(cfg) = config_ref {
        if let Some(preset_name) = cfg.preset.as_deref() {
            if preset_name != "custom" {
                if let Some(preset) = presets::lookup(preset_name) {
                    merge::apply(&mut resolved, &preset);
                } else {
                    tracing::debug!(preset = preset_name, "unknown preset, defaults only");
                }
            }
        }
        if let Some(overrides) = &cfg.overrides {
            merge::apply(&mut resolved, overrides);
        }
    }

    resolved
}

/// The per-invocation profile `llm.invoke` actually sends, produced by
/// overlaying `action_params` on `resolved.generation` + `resolved.provider`
/// (spec §4.1's `action_config` helper).
#[derive(Debug, Clone, PartialEq)]
pub struct ActionLlmConfig {
    /// Sampling temperature for this call.
    pub temperature: f64,
    /// Max tokens for this call.
    pub max_tokens: u32,
    /// Response format for this call.
    pub response_format: ResponseFormat,
    /// Provider to invoke.
    pub provider: String,
    /// Model to invoke.
    pub model: String,
    /// Whether a provider/model fallback is allowed for this call.
    pub allow_fallback: bool,
}

/// Overlay `action_params` (untyped JSON, e.g. `{"temperature": 0.2}`) on top
/// of `resolved`'s generation and provider sections. Recognised keys:
/// `temperature`, `maxTokens`, `responseFormat` (`"text"`/`"json"`),
/// `provider`, `model`, `allowFallback`. Anything else is ignored — unknown
/// action params are not a validation error at this layer.
#[must_use]
pub fn action_config(resolved: &ResolvedLlmConfig, action_params: &Map<String, Value>) -> ActionLlmConfig {
    let mut out = ActionLlmConfig {
        temperature: resolved.generation.temperature,
        max_tokens: resolved.generation.max_tokens,
        response_format: resolved.generation.response_format,
        provider: resolved.provider.provider.clone(),
        model: resolved.provider.model.clone(),
        allow_fallback: resolved.provider.allow_fallback,
    };

    if let Some(v) = action_params.get("temperature").and_then(Value::as_f64) {
        out.temperature = v;
    }
    if let Some(v) = action_params
        .get("maxTokens")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
    {
        out.max_tokens = v;
    }
    match action_params.get("responseFormat").and_then(Value::as_str) {
        Some("json") => out.response_format = ResponseFormat::Json,
        Some("text") => out.response_format = ResponseFormat::Text,
        _ => {}
    }
    if let Some(v) = action_params.get("provider").and_then(Value::as_str) {
        out.provider = v.to_string();
    }
    if let Some(v) = action_params.get("model").and_then(Value::as_str) {
        out.model = v.to_string();
    }
    if let Some(v) = action_params.get("allowFallback").and_then(Value::as_bool) {
        out.allow_fallback = v;
    }

    out
}

/// `strategy ∈ {embedding, hybrid}` (spec §4.1 derived helper).
#[must_use]
pub const fn should_use_embedding_routing(resolved: &ResolvedLlmConfig) -> bool {
    matches!(resolved.routing.strategy, RoutingStrategy::Embedding | RoutingStrategy::Hybrid)
}

/// Whether an LLM fallback should run given the routing strategy and, for
/// `hybrid`, the best embedding similarity observed so far (spec §4.1
/// derived helper). `true` for `llm`; `false` for `embedding`/`rules`; for
/// `hybrid`, `true` iff `similarity < confidence_threshold` — a missing
/// similarity (no embedding candidate cleared the bar at all) counts as
/// below threshold.
#[must_use]
pub fn should_use_llm_fallback(resolved: &ResolvedLlmConfig, similarity: Option<f64>) -> bool {
    match resolved.routing.strategy {
        RoutingStrategy::Llm => true,
        RoutingStrategy::Embedding | RoutingStrategy::Rules => false,
        RoutingStrategy::Hybrid => similarity.is_none_or(|s| s < resolved.routing.confidence_threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_no_overlays_is_system_defaults() {
        assert_eq!(resolve(None, None), system_defaults());
    }

    #[test]
    fn config_idempotence() {
        let cfg_ref = ConfigRef {
            preset: Some("conversational".to_string()),
            overrides: Some(ConfigOverrides {
                generation: Some(GenerationOverrides {
                    temperature: Some(0.3),
                    max_tokens: None,
                    response_format: None,
                }),
                ..Default::default()
            }),
        };
        let a = resolve(Some(&cfg_ref), None);
        let b = resolve(Some(&cfg_ref), None);
        assert_eq!(a, b);
    }

    #[test]
    fn preset_then_explicit_override_wins() {
        let cfg_ref = ConfigRef {
            preset: Some("routing".to_string()),
            overrides: Some(ConfigOverrides {
                generation: Some(GenerationOverrides {
                    temperature: Some(0.42),
                    max_tokens: None,
                    response_format: None,
                }),
                ..Default::default()
            }),
        };
        let resolved = resolve(Some(&cfg_ref), None);
        // routing preset sets temperature 0.0, but the explicit override
        // (applied after the preset) must win.
        assert_eq!(resolved.generation.temperature, 0.42);
        assert_eq!(resolved.generation.response_format, ResponseFormat::Json);
    }

    #[test]
    fn unknown_preset_degrades_to_defaults() {
        let cfg_ref = ConfigRef {
            preset: Some("nonexistent".to_string()),
            overrides: None,
        };
        assert_eq!(resolve(Some(&cfg_ref), None), system_defaults());
    }

    #[test]
    fn custom_preset_name_is_a_no_op_marker() {
        let cfg_ref = ConfigRef {
            preset: Some("custom".to_string()),
            overrides: None,
        };
        assert_eq!(resolve(Some(&cfg_ref), None), system_defaults());
    }

    #[test]
    fn action_config_overlays_params_on_resolved() {
        let resolved = system_defaults();
        let mut params = Map::new();
        params.insert("temperature".into(), Value::from(0.1));
        params.insert("model".into(), Value::from("gpt-4o"));
        let action = action_config(&resolved, &params);
        assert_eq!(action.temperature, 0.1);
        assert_eq!(action.model, "gpt-4o");
        assert_eq!(action.provider, resolved.provider.provider);
    }

    #[test]
    fn hybrid_fallback_threshold() {
        let mut resolved = system_defaults();
        resolved.routing.strategy = RoutingStrategy::Hybrid;
        resolved.routing.confidence_threshold = 0.85;
        assert!(should_use_llm_fallback(&resolved, Some(0.5)));
        assert!(!should_use_llm_fallback(&resolved, Some(0.9)));
        assert!(should_use_llm_fallback(&resolved, None));
    }

    #[test]
    fn rules_and_embedding_never_fall_back() {
        let mut resolved = system_defaults();
        resolved.routing.strategy = RoutingStrategy::Rules;
        assert!(!should_use_llm_fallback(&resolved, None));
        resolved.routing.strategy = RoutingStrategy::Embedding;
        assert!(!should_use_llm_fallback(&resolved, Some(0.99)));
    }

    #[test]
    fn embedding_routing_flag() {
        let mut resolved = system_defaults();
        resolved.routing.strategy = RoutingStrategy::Embedding;
        assert!(should_use_embedding_routing(&resolved));
        resolved.routing.strategy = RoutingStrategy::Rules;
        assert!(!should_use_embedding_routing(&resolved));
    }
}
