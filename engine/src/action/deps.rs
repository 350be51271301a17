//! Shared dependencies and run-scoped mutable state for action handlers.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use lru::LruCache;
use serde_json::{Map, Value};

use crate::collaborators::{CallContext, CircuitBreaker, Collaborators};
use crate::model::ConversationState;
use crate::router::Router;

use super::cancellation::CancellationToken;

/// Minimum LRU capacity spec §4.3 requires for the embedding cache.
pub const EMBEDDING_CACHE_MIN_CAPACITY: usize = 1024;

/// Dependencies shared across every action handler invocation within a
/// process: collaborator clients, the process-wide embedding LRU
/// (spec §4.3, §5), per-target circuit breakers (spec §5), and the router.
#[derive(Clone)]
pub struct ActionDeps {
    pub collaborators: Collaborators,
    pub embedding_cache: Arc<Mutex<LruCache<String, Vec<f32>>>>,
    pub breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
    pub router: Arc<Router>,
    pub service_id: String,
}

impl ActionDeps {
    /// Build deps with a fresh embedding cache sized at least
    /// [`EMBEDDING_CACHE_MIN_CAPACITY`].
    #[must_use]
    pub fn new(collaborators: Collaborators, router: Arc<Router>, service_id: impl Into<String>, cache_capacity: usize) -> Self {
        let capacity = cache_capacity.max(EMBEDDING_CACHE_MIN_CAPACITY);
        Self {
            collaborators,
            embedding_cache: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("capacity is clamped above zero"),
            ))),
            breakers: Arc::new(DashMap::new()),
            router,
            service_id,
        }
    }

    /// Fetch (or create) the circuit breaker guarding `target`.
    #[must_use]
    pub fn breaker_for(&self, target: &str) -> Arc<CircuitBreaker> {
        self.breakers.entry(target.to_string()).or_insert_with(|| Arc::new(CircuitBreaker::new())).clone()
    }
}

/// Run-scoped mutable state threaded through one rule's action sequence
/// (spec §4.4 step 3: state updates visible to subsequent actions of *this*
/// run; spec §4.3 `context.update`/`message.send` `suppressResponse`
/// coupling).
pub struct RunState {
    /// Current conversation state, updated in place by a successful
    /// `state.transition` so later actions in the same run observe it.
    pub conversation_state: ConversationState,
    /// Set by `assistant.route`/`embedding.route` on a successful route;
    /// `message.send` checks this and no-ops when set.
    pub suppress_response: bool,
    /// Accumulated `context.update` outputs, last-writer-wins per top-level
    /// key within this run (spec §4.3).
    pub context_patch: Map<String, Value>,
    /// Current bearer token/API key for outbound calls; replaced in place by
    /// the coordinator's token-auth recovery (spec §8 invariant 10).
    pub token: String,
    /// Correlation id for outbound headers and egress control events.
    pub trace_id: Option<String>,
    /// Cooperative cancellation for this run's deadline (spec §5).
    pub cancellation: CancellationToken,
}

impl RunState {
    /// Build fresh run state from a conversation's current state.
    #[must_use]
    pub fn new(conversation_state: ConversationState, token: impl Into<String>, trace_id: Option<String>) -> Self {
        Self {
            conversation_state,
            suppress_response: false,
            context_patch: Map::new(),
            token: token.into(),
            trace_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Build a [`CallContext`] for an outbound call within this run.
    #[must_use]
    pub fn call_context(&self, org_id: &str, service_id: &str, as_user_id: Option<String>) -> CallContext {
        CallContext {
            org_id: org_id.to_string(),
            service_id: service_id.to_string(),
            trace_id: self.trace_id.clone(),
            token: self.token.clone(),
            as_user_id,
        }
    }
}
