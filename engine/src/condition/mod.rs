//! C2 — Condition Evaluator (spec §4.2).
//!
//! `evaluate(group, ctx) -> bool`, recursive descent, short-circuiting. Pure
//! and side-effect-free: no I/O, no mutation of `ctx`.

use regex::Regex;
use serde_json::Value;

use crate::model::{Condition, ConditionGroup, ConditionNode, ExecutionContext, Logic, Operator};

/// Evaluate a condition tree against an execution context (spec §4.2
/// contract). Terminates for any finite tree (spec §8 invariant 5): there is
/// no recursion on anything but the tree's own structure.
#[must_use]
pub fn evaluate(group: &ConditionGroup, ctx: &ExecutionContext) -> bool {
    evaluate_counted(group, ctx).0
}

/// Like [`evaluate`], but also returns the number of leaf conditions
/// actually evaluated before short-circuiting — what
/// [`crate::model::RuleExecutionResult::conditions_evaluated`] reports.
#[must_use]
pub fn evaluate_counted(group: &ConditionGroup, ctx: &ExecutionContext) -> (bool, u32) {
    let mut count = 0;
    let result = eval_group(group, ctx, &mut count);
    (result, count)
}

fn eval_group(group: &ConditionGroup, ctx: &ExecutionContext, count: &mut u32) -> bool {
    match group.logic {
        Logic::And => group.conditions.iter().all(|node| eval_node(node, ctx, count)),
        Logic::Or => group.conditions.iter().any(|node| eval_node(node, ctx, count)),
    }
}

fn eval_node(node: &ConditionNode, ctx: &ExecutionContext, count: &mut u32) -> bool {
    match node {
        ConditionNode::Leaf(condition) => {
            *count += 1;
            eval_leaf(condition, ctx)
        }
        ConditionNode::Group(group) => eval_group(group, ctx, count),
    }
}

fn eval_leaf(condition: &Condition, ctx: &ExecutionContext) -> bool {
    let resolved = ctx.resolve_path(&condition.field);

    match condition.operator {
        Operator::Exists => resolved.is_some_and(|v| !v.is_null()),
        Operator::NotExists => resolved.is_none_or(|v| v.is_null()),
        _ => match resolved {
            None => false,
            Some(actual) => eval_comparison(condition.operator, &actual, &condition.value),
        },
    }
}

fn eval_comparison(operator: Operator, actual: &Value, expected: &Value) -> bool {
    match operator {
        Operator::Eq => values_equal(actual, expected),
        Operator::Neq => !values_equal(actual, expected),
        Operator::Gt => numeric_cmp(actual, expected).is_some_and(|o| o.is_gt()),
        Operator::Gte => numeric_cmp(actual, expected).is_some_and(|o| o.is_ge()),
        Operator::Lt => numeric_cmp(actual, expected).is_some_and(|o| o.is_lt()),
        Operator::Lte => numeric_cmp(actual, expected).is_some_and(|o| o.is_le()),
        Operator::Contains => contains(actual, expected),
        Operator::NotContains => !contains(actual, expected),
        Operator::StartsWith => str_pair(actual, expected).is_some_and(|(a, b)| a.starts_with(b)),
        Operator::EndsWith => str_pair(actual, expected).is_some_and(|(a, b)| a.ends_with(b)),
        Operator::Matches => regex_match(actual, expected),
        Operator::NotMatches => !regex_match(actual, expected),
        Operator::In => member_of(actual, expected),
        Operator::NotIn => !member_of(actual, expected),
        Operator::Exists | Operator::NotExists => unreachable!("handled in eval_leaf"),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return (x - y).abs() < f64::EPSILON;
    }
    a == b
}

fn numeric_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    let (x, y) = (a.as_f64()?, b.as_f64()?);
    x.partial_cmp(&y)
}

fn str_pair<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((a.as_str()?, b.as_str()?))
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(s) => expected.as_str().is_some_and(|needle| s.contains(needle)),
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        _ => false,
    }
}

fn regex_match(actual: &Value, pattern: &Value) -> bool {
    let (Some(text), Some(pattern)) = (actual.as_str(), pattern.as_str()) else {
        return false;
    };
    // Compiled once per evaluation (spec §4.2); condition trees are short-lived
    // per run so no cross-run cache is warranted here.
    match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "invalid regex in matches/not_matches condition");
            false
        }
    }
}

fn member_of(actual: &Value, list: &Value) -> bool {
    let Some(items) = list.as_array() else {
        return false;
    };
    items.iter().any(|item| values_equal(item, actual))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::*;
    use crate::model::{
        ContextWindowConfig, EmbeddingConfig, EventEnvelope, GenerationConfig, ObservabilityConfig,
        ProviderSelectionConfig, ReliabilityConfig, ResolvedLlmConfig, ResponseFormat,
        RoutingConfig, RoutingStrategy, SafetyConfig, TruncationStrategy, Trigger,
    };
    use crate::model::ConversationState;

    fn llm_config() -> ResolvedLlmConfig {
        ResolvedLlmConfig {
            generation: GenerationConfig {
                temperature: 0.7,
                max_tokens: 512,
                response_format: ResponseFormat::Text,
            },
            provider: ProviderSelectionConfig {
                provider: "openai".into(),
                model: "gpt-4".into(),
                allow_fallback: false,
            },
            embedding: EmbeddingConfig {
                provider: "openai".into(),
                model: "text-embedding-3-small".into(),
                cache_embeddings: true,
            },
            routing: RoutingConfig {
                strategy: RoutingStrategy::Rules,
                similarity_threshold: 0.8,
                confidence_threshold: 0.6,
            },
            safety: SafetyConfig { moderation_enabled: false },
            reliability: ReliabilityConfig {
                timeout_ms: 10_000,
                max_retries: 2,
                initial_backoff_ms: 200,
            },
            context: ContextWindowConfig {
                max_context_tokens: 8_192,
                truncation: TruncationStrategy::SlidingWindow,
            },
            observability: ObservabilityConfig { track_usage: true },
        }
    }

    fn ctx_with(context: Map<String, Value>) -> ExecutionContext {
        ExecutionContext {
            org_id: "org-1".into(),
            conversation_id: "conv-1".into(),
            conversation_state: ConversationState::Idle,
            trigger: Trigger::MessageReceived,
            event: EventEnvelope {
                id: "evt-1".into(),
                event_type: Trigger::MessageReceived,
                timestamp: "2026-01-01T00:00:00Z".into(),
                data: Map::new(),
            },
            message: None,
            user: None,
            context,
            metadata: Map::new(),
            llm_config: llm_config(),
            assistant_key: "support-bot".into(),
        }
    }

    fn leaf(field: &str, operator: Operator, value: Value) -> ConditionNode {
        ConditionNode::Leaf(Condition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    #[test]
    fn and_short_circuits_on_false() {
        let ctx = ctx_with(Map::new());
        let group = ConditionGroup {
            logic: Logic::And,
            conditions: vec![
                leaf("context.missing", Operator::Exists, Value::Null),
                leaf("context.missing", Operator::Eq, json!("x")),
            ],
        };
        let (result, evaluated) = evaluate_counted(&group, &ctx);
        assert!(!result);
        assert_eq!(evaluated, 1, "and should stop after the first false leaf");
    }

    #[test]
    fn or_short_circuits_on_true() {
        let mut context = Map::new();
        context.insert("flag".into(), json!(true));
        let ctx = ctx_with(context);
        let group = ConditionGroup {
            logic: Logic::Or,
            conditions: vec![
                leaf("context.flag", Operator::Eq, json!(true)),
                leaf("context.flag", Operator::Eq, json!(false)),
            ],
        };
        let (result, evaluated) = evaluate_counted(&group, &ctx);
        assert!(result);
        assert_eq!(evaluated, 1);
    }

    #[test]
    fn missing_field_only_satisfies_exists_checks() {
        let ctx = ctx_with(Map::new());
        assert!(!eval_leaf(
            &Condition { field: "context.nope".into(), operator: Operator::Eq, value: json!("x") },
            &ctx
        ));
        assert!(eval_leaf(
            &Condition { field: "context.nope".into(), operator: Operator::NotExists, value: Value::Null },
            &ctx
        ));
        assert!(!eval_leaf(
            &Condition { field: "context.nope".into(), operator: Operator::Exists, value: Value::Null },
            &ctx
        ));
    }

    #[test]
    fn numeric_comparison_coerces_only_when_both_numeric() {
        let mut context = Map::new();
        context.insert("count".into(), json!(5));
        let ctx = ctx_with(context);
        assert!(eval_leaf(
            &Condition { field: "context.count".into(), operator: Operator::Gt, value: json!(3) },
            &ctx
        ));
        assert!(!eval_leaf(
            &Condition { field: "context.count".into(), operator: Operator::Gt, value: json!("3") },
            &ctx
        ));
    }

    #[test]
    fn in_requires_list_value() {
        let mut context = Map::new();
        context.insert("tier".into(), json!("gold"));
        let ctx = ctx_with(context);
        assert!(eval_leaf(
            &Condition { field: "context.tier".into(), operator: Operator::In, value: json!(["gold", "platinum"]) },
            &ctx
        ));
        assert!(!eval_leaf(
            &Condition { field: "context.tier".into(), operator: Operator::In, value: json!("gold") },
            &ctx
        ));
    }

    #[test]
    fn matches_compiles_regex() {
        let mut context = Map::new();
        context.insert("code".into(), json!("ABC-123"));
        let ctx = ctx_with(context);
        assert!(eval_leaf(
            &Condition { field: "context.code".into(), operator: Operator::Matches, value: json!(r"^[A-Z]{3}-\d+$") },
            &ctx
        ));
        assert!(!eval_leaf(
            &Condition { field: "context.code".into(), operator: Operator::NotMatches, value: json!(r"^[A-Z]{3}-\d+$") },
            &ctx
        ));
    }

    #[test]
    fn case_sensitive_string_ops() {
        let mut context = Map::new();
        context.insert("name".into(), json!("Hello"));
        let ctx = ctx_with(context);
        assert!(!eval_leaf(
            &Condition { field: "context.name".into(), operator: Operator::Eq, value: json!("hello") },
            &ctx
        ));
    }

    #[test]
    fn deeply_nested_group_terminates() {
        let ctx = ctx_with(Map::new());
        let mut group = ConditionGroup::new(Logic::And);
        for _ in 0..50 {
            group = ConditionGroup {
                logic: Logic::Or,
                conditions: vec![ConditionNode::Group(group)],
            };
        }
        // Vacuous `and` group at the bottom evaluates true, bubbling up
        // through nested single-child `or` groups.
        assert!(evaluate(&group, &ctx));
    }
}
