//! Section-dispatched deep merge (spec §4.1, §9 design note).
//!
//! Each section of [`crate::model::ResolvedLlmConfig`] gets its own merge
//! function rather than a single generic reflective merge over an untyped
//! tree — this is the "known sections get explicit merge functions" design
//! note. Scalar fields are later-wins; `None` in an overlay means absent and
//! leaves the base untouched (spec §8 invariant 4, merge associativity).

use crate::model::ResolvedLlmConfig;

use super::overrides::ConfigOverrides;

/// Apply one overlay on top of `base`, section by section. Pure: `base` is
/// mutated in place, `overlay` is only read.
pub fn apply(base: &mut ResolvedLlmConfig, overlay: &ConfigOverrides) {
    if let Some(g) = &overlay.generation {
        if let Some(v) = g.temperature {
            base.generation.temperature = v;
        }
        if let Some(v) = g.max_tokens {
            base.generation.max_tokens = v;
        }
        if let Some(v) = g.response_format {
            base.generation.response_format = v;
        }
    }
    if let Some(p) = &overlay.provider {
        if let Some(v) = &p.provider {
            base.provider.provider = v.clone();
        }
        if let Some(v) = &p.model {
            base.provider.model = v.clone();
        }
        if let Some(v) = p.allow_fallback {
            base.provider.allow_fallback = v;
        }
    }
    if let Some(e) = &overlay.embedding {
        if let Some(v) = &e.provider {
            base.embedding.provider = v.clone();
        }
        if let Some(v) = &e.model {
            base.embedding.model = v.clone();
        }
        if let Some(v) = e.cache_embeddings {
            base.embedding.cache_embeddings = v;
        }
    }
    if let Some(r) = &overlay.routing {
        if let Some(v) = r.strategy {
            base.routing.strategy = v;
        }
        if let Some(v) = r.similarity_threshold {
            base.routing.similarity_threshold = v;
        }
        if let Some(v) = r.confidence_threshold {
            base.routing.confidence_threshold = v;
        }
    }
    if let Some(s) = &overlay.safety {
        if let Some(v) = s.moderation_enabled {
            base.safety.moderation_enabled = v;
        }
    }
    if let Some(r) = &overlay.reliability {
        if let Some(v) = r.timeout_ms {
            base.reliability.timeout_ms = v;
        }
        if let Some(v) = r.max_retries {
            base.reliability.max_retries = v;
        }
        if let Some(v) = r.initial_backoff_ms {
            base.reliability.initial_backoff_ms = v;
        }
    }
    if let Some(c) = &overlay.context {
        if let Some(v) = c.max_context_tokens {
            base.context.max_context_tokens = v;
        }
        if let Some(v) = c.truncation {
            base.context.truncation = v;
        }
    }
    if let Some(o) = &overlay.observability {
        if let Some(v) = o.track_usage {
            base.observability.track_usage = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::system_defaults;
    use crate::config::overrides::{GenerationOverrides, ReliabilityOverrides};

    #[test]
    fn scalar_overlay_is_later_wins() {
        let mut base = system_defaults();
        let overlay = ConfigOverrides {
            generation: Some(GenerationOverrides {
                temperature: Some(0.2),
                max_tokens: None,
                response_format: None,
            }),
            ..Default::default()
        };
        apply(&mut base, &overlay);
        assert_eq!(base.generation.temperature, 0.2);
    }

    #[test]
    fn absent_section_leaves_base_untouched() {
        let mut base = system_defaults();
        let before = base.clone();
        apply(&mut base, &ConfigOverrides::default());
        assert_eq!(base, before);
    }

    #[test]
    fn merge_associativity_per_section() {
        let a = ConfigOverrides {
            reliability: Some(ReliabilityOverrides {
                timeout_ms: Some(1_000),
                max_retries: None,
                initial_backoff_ms: None,
            }),
            ..Default::default()
        };
        let b = ConfigOverrides {
            reliability: Some(ReliabilityOverrides {
                timeout_ms: None,
                max_retries: Some(5),
                initial_backoff_ms: None,
            }),
            ..Default::default()
        };
        let c = ConfigOverrides {
            generation: Some(GenerationOverrides {
                temperature: Some(0.9),
                max_tokens: None,
                response_format: None,
            }),
            ..Default::default()
        };

        let mut lhs = system_defaults();
        apply(&mut lhs, &a);
        apply(&mut lhs, &b);
        apply(&mut lhs, &c);

        let mut rhs = system_defaults();
        apply(&mut rhs, &a);
        apply(&mut rhs, &b);
        apply(&mut rhs, &c);

        assert_eq!(lhs, rhs);
    }
}
