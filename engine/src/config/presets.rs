//! Named preset overlays (spec §4.1 "Recognised presets").
//!
//! Each preset is expressed as a [`ConfigOverrides`] — the same shape
//! `config_ref.overrides` takes — so [`super::merge::merge_overrides`] applies
//! it with the identical section-dispatched logic used for org defaults and
//! explicit overrides.

use crate::model::{ResponseFormat, RoutingStrategy, TruncationStrategy};

use super::overrides::{
    ContextOverrides, GenerationOverrides, ProviderOverrides, ReliabilityOverrides,
    RoutingOverrides,
};
use super::ConfigOverrides;

/// Look up a preset by name. Unknown names degrade gracefully to `None`,
/// which callers treat as "no preset overlay" (spec §4.1: "Unknown preset
/// names degrade gracefully: defaults only").
#[must_use]
pub fn lookup(name: &str) -> Option<ConfigOverrides> {
    match name {
        "routing" => Some(routing()),
        "conversational" => Some(conversational()),
        "code" => Some(code()),
        "reasoning" => Some(reasoning()),
        _ => None,
    }
}

fn routing() -> ConfigOverrides {
    ConfigOverrides {
        generation: Some(GenerationOverrides {
            temperature: Some(0.0),
            max_tokens: None,
            response_format: Some(ResponseFormat::Json),
        }),
        provider: None,
        embedding: None,
        routing: None,
        safety: None,
        reliability: Some(ReliabilityOverrides {
            timeout_ms: Some(10_000),
            max_retries: Some(2),
            initial_backoff_ms: None,
        }),
        context: Some(ContextOverrides {
            max_context_tokens: Some(2_048),
            truncation: None,
        }),
        observability: None,
    }
}

fn conversational() -> ConfigOverrides {
    ConfigOverrides {
        generation: Some(GenerationOverrides {
            temperature: Some(0.7),
            max_tokens: None,
            response_format: Some(ResponseFormat::Text),
        }),
        provider: Some(ProviderOverrides {
            provider: None,
            model: None,
            allow_fallback: Some(true),
        }),
        embedding: None,
        routing: None,
        safety: None,
        reliability: None,
        context: None,
        observability: None,
    }
}

fn code() -> ConfigOverrides {
    ConfigOverrides {
        generation: Some(GenerationOverrides {
            temperature: Some(0.1),
            max_tokens: None,
            response_format: None,
        }),
        provider: None,
        embedding: None,
        routing: None,
        safety: None,
        reliability: None,
        context: Some(ContextOverrides {
            max_context_tokens: Some(16_384),
            truncation: Some(TruncationStrategy::SlidingWindow),
        }),
        observability: None,
    }
}

fn reasoning() -> ConfigOverrides {
    ConfigOverrides {
        generation: Some(GenerationOverrides {
            temperature: Some(1.0),
            max_tokens: None,
            response_format: None,
        }),
        provider: Some(ProviderOverrides {
            provider: None,
            model: None,
            allow_fallback: Some(false),
        }),
        embedding: None,
        routing: Some(RoutingOverrides {
            strategy: None,
            similarity_threshold: None,
            confidence_threshold: None,
        }),
        safety: None,
        reliability: Some(ReliabilityOverrides {
            timeout_ms: Some(120_000),
            max_retries: None,
            initial_backoff_ms: None,
        }),
        context: Some(ContextOverrides {
            max_context_tokens: None,
            truncation: Some(TruncationStrategy::Summarization),
        }),
        observability: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_preset_is_none() {
        assert!(lookup("made-up").is_none());
    }

    #[test]
    fn known_presets_resolve() {
        for name in ["routing", "conversational", "code", "reasoning"] {
            assert!(lookup(name).is_some(), "{name} should resolve");
        }
    }
}
