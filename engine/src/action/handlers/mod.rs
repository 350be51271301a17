//! Built-in action handlers and the registry that wires them up
//! (spec §4.3's `actionType -> Handler` table).

mod context_update;
mod control_flow;
mod embedding;
mod handoff;
mod integration;
mod llm;
mod messaging;
mod routing;
mod state_transition;
mod workspace;

pub use context_update::ContextUpdateHandler;
pub use control_flow::{ConditionHandler, LoopHandler, ParallelHandler, WaitHandler};
pub use embedding::{EmbeddingCreateHandler, EmbeddingSearchHandler};
pub use handoff::{HandoffAssignHandler, HandoffCreateHandler, HandoffResolveHandler};
pub use integration::IntegrationInvokeHandler;
pub use llm::LlmInvokeHandler;
pub use messaging::MessageSendHandler;
pub use routing::{AssistantRouteHandler, EmbeddingRouteHandler};
pub use state_transition::StateTransitionHandler;
pub use workspace::{WorkspaceCreateHandler, WorkspaceDestroyHandler};

use crate::action::ActionRegistry;

/// Build the production registry with every built-in handler registered
/// under its `actionType` key (spec §4.3).
#[must_use]
pub fn build_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register("llm.invoke", Box::new(LlmInvokeHandler));
    registry.register("embedding.create", Box::new(EmbeddingCreateHandler));
    registry.register("embedding.search", Box::new(EmbeddingSearchHandler));
    registry.register("message.send", Box::new(MessageSendHandler));
    registry.register("state.transition", Box::new(StateTransitionHandler));
    registry.register("context.update", Box::new(ContextUpdateHandler));
    registry.register("wait", Box::new(WaitHandler));
    registry.register("parallel", Box::new(ParallelHandler));
    registry.register("condition", Box::new(ConditionHandler));
    registry.register("loop", Box::new(LoopHandler));
    registry.register("handoff.create", Box::new(HandoffCreateHandler));
    registry.register("handoff.assign", Box::new(HandoffAssignHandler));
    registry.register("handoff.resolve", Box::new(HandoffResolveHandler));
    registry.register("assistant.route", Box::new(AssistantRouteHandler));
    registry.register("embedding.route", Box::new(EmbeddingRouteHandler));
    registry.register("integration.invoke", Box::new(IntegrationInvokeHandler));
    registry.register("workspace.create", Box::new(WorkspaceCreateHandler));
    registry.register("workspace.destroy", Box::new(WorkspaceDestroyHandler));
    registry
}
