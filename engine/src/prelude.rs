//! Convenience re-exports for the most commonly used types across the
//! engine's six components.

pub use crate::action::{ActionDeps, ActionHandler, ActionRegistry, ActionRun, RunState};
pub use crate::collaborators::Collaborators;
pub use crate::condition::evaluate;
pub use crate::config::{resolve as resolve_llm_config, system_defaults};
pub use crate::error::{ActionError, EngineError, Result, RunOutcome, TokenAuthError};
pub use crate::model::{
    ActionConfig, ActionResult, Condition, ConditionGroup, ConditionNode, ConversationState,
    ExecutionContext, Message, ResolvedLlmConfig, Rule, RuleExecutionResult, RuleSet, RunResult,
    Trigger,
};
pub use crate::registry::RuleSetRegistry;
pub use crate::router::Router;
pub use crate::rule::execute as execute_rule_set;
pub use crate::run::{
    ConversationStore, CredentialRefresher, InboundEvent, Mailbox, RunCoordinator,
    StaticCredentialRefresher,
};
