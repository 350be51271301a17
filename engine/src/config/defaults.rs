//! SYSTEM_DEFAULTS (spec §4.1): the floor every resolution starts from.

use crate::model::{
    ContextWindowConfig, EmbeddingConfig, GenerationConfig, ObservabilityConfig,
    ProviderSelectionConfig, ReliabilityConfig, ResolvedLlmConfig, ResponseFormat, RoutingConfig,
    RoutingStrategy, SafetyConfig, TruncationStrategy,
};

/// The fully-populated baseline [`resolve`](super::resolve) deep-merges
/// everything else on top of.
#[must_use]
pub fn system_defaults() -> ResolvedLlmConfig {
    ResolvedLlmConfig {
        generation: GenerationConfig {
            temperature: 0.7,
            max_tokens: 1_024,
            response_format: ResponseFormat::Text,
        },
        provider: ProviderSelectionConfig {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            allow_fallback: false,
        },
        embedding: EmbeddingConfig {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            cache_embeddings: true,
        },
        routing: RoutingConfig {
            strategy: RoutingStrategy::Rules,
            similarity_threshold: 0.75,
            confidence_threshold: 0.85,
        },
        safety: SafetyConfig {
            moderation_enabled: true,
        },
        reliability: ReliabilityConfig {
            timeout_ms: 45_000,
            max_retries: 3,
            initial_backoff_ms: 250,
        },
        context: ContextWindowConfig {
            max_context_tokens: 8_192,
            truncation: TruncationStrategy::SlidingWindow,
        },
        observability: ObservabilityConfig { track_usage: true },
    }
}
