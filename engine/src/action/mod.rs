//! C3 — Action Dispatcher (spec §4.3).
//!
//! A map keyed by `actionType` to a [`ActionHandler`] trait object — the
//! "tagged variant `Action` plus a registry mapping tag → `Handler`
//! trait/interface" from spec §9, replacing the source's class-inheritance
//! polymorphism. An unknown type yields a failure [`ActionResult`]; the
//! dispatcher itself never panics or propagates except for
//! [`crate::error::TokenAuthError`], which handlers raise directly.

pub mod cancellation;
pub mod deps;
pub mod handlers;
pub mod retry;

pub use cancellation::CancellationToken;
pub use deps::{ActionDeps, RunState, EMBEDDING_CACHE_MIN_CAPACITY};

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Map;

use crate::collaborators::require_active;
use crate::error::TokenAuthError;
use crate::model::{ActionConfig, ActionResult, ExecutionContext};

/// One action invocation's view of the run: read-only execution context,
/// mutable run-scoped state, shared dependencies, and the registry itself
/// (so `parallel`/`condition`/`loop` can recurse into sibling actions).
pub struct ActionRun<'a> {
    pub ctx: &'a ExecutionContext,
    pub state: &'a mut RunState,
    pub deps: &'a ActionDeps,
    pub registry: &'a ActionRegistry,
}

/// The contract every action handler implements (spec §4.3: `execute(config,
/// ctx) -> ActionResult`). A handler may raise [`TokenAuthError`] — the one
/// error that is allowed to escape the dispatcher — by returning `Err` here;
/// every other failure is folded into a failed [`ActionResult`] by the
/// handler itself.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, params: &Map<String, serde_json::Value>, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError>;
}

/// The `actionType -> Handler` map (spec §4.3).
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Build an empty registry. Use [`handlers::build_registry`] for the
    /// fully wired production set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `action_type`. Registering the same type
    /// twice replaces the previous handler — a startup-time operation only
    /// (spec §9: "programming errors in handler registration (startup
    /// refuses)" governs misconfiguration upstream of this map).
    pub fn register(&mut self, action_type: impl Into<String>, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(action_type.into(), handler);
    }

    /// Dispatch one action. Always measures `durationMs`; an unknown
    /// `actionType` is a failed [`ActionResult`], never a panic. Introspects
    /// the run's current token first (spec §6: "a dedicated `TokenAuthError`
    /// is raised when introspection returns `active=false` during an
    /// action") — a failure to reach Identity itself is not treated as an
    /// expired token, only a confirmed `active=false` is.
    pub async fn dispatch(&self, config: &ActionConfig, run: &mut ActionRun<'_>) -> Result<ActionResult, TokenAuthError> {
        let started = Instant::now();
        match run.deps.collaborators.identity.introspect(&run.state.token).await {
            Ok(introspection) => require_active(&introspection, &run.state.token)?,
            Err(err) => tracing::debug!(error = %err, "token introspection unavailable, proceeding without a freshness check"),
        }

        let Some(handler) = self.handlers.get(config.action_type.as_str()) else {
            return Ok(ActionResult::failed(
                &config.action_type,
                format!("unknown action type '{}'", config.action_type),
                elapsed_ms(started),
            ));
        };

        match handler.execute(&config.params, run).await {
            Ok(mut result) => {
                result.duration_ms = elapsed_ms(started);
                Ok(result)
            }
            Err(token_err) => Err(token_err),
        }
    }
}

/// Milliseconds elapsed since `started`, saturating at `u64::MAX` (never
/// happens in practice, just avoids a panic on overflow).
#[must_use]
pub fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
