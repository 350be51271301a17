//! Error taxonomy for the rule/routing engine.
//!
//! Three tiers, matching spec §7:
//!
//! - [`ActionError`] — recorded into an `ActionResult.error`; never escapes
//!   the dispatcher.
//! - [`EngineError`] — surfaced by coordinator-level operations (rule set
//!   load, persistence, mailbox overload).
//! - [`TokenAuthError`] — a distinguished error that propagates *past* the
//!   rule engine so the run coordinator can refresh credentials and retry
//!   the event exactly once.

use thiserror::Error;

/// A type alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors a single action handler can produce.
///
/// These never propagate as Rust errors past the dispatcher: they are
/// captured into `ActionResult.error` and the run continues per spec §7's
/// propagation policy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// Unknown `actionType`, bad `params`, or an illegal state transition.
    #[error("validation error: {0}")]
    Validation(String),

    /// DNS, connect, or 5xx from a collaborator.
    #[error("network error: {0}")]
    Network(String),

    /// Action or run deadline exceeded.
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Non-token auth failure from a collaborator.
    #[error("auth error: {0}")]
    Auth(String),

    /// Missing assistant, missing rule set target, missing context path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Mailbox full or circuit open.
    #[error("overloaded: {0}")]
    Overloaded(String),

    /// Programming bug surfaced as a recorded failure rather than a panic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// True for errors spec §7 allows retrying (`NetworkError`, and
    /// `TimeoutError` only when the caller still has retries budgeted).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Errors surfaced by the run coordinator and rule executor themselves,
/// as opposed to individual action failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No active rule set for `<assistant-key>:<org-id>` or its default
    /// fallback.
    #[error("no active rule set for assistant '{assistant_key}' (org '{org_id}')")]
    NoRuleSet {
        /// Assistant alias the rule set was requested for.
        assistant_key: String,
        /// Organization the event belongs to.
        org_id: String,
    },

    /// Per-conversation mailbox is at its bounded depth.
    #[error("conversation '{0}' mailbox overloaded")]
    MailboxOverloaded(String),

    /// Conversation state/context store failed to read or write.
    #[error("conversation store error: {0}")]
    Store(String),

    /// An action handler reported a non-retryable failure that the rule
    /// aggregation step chose to surface as a run-level error.
    #[error("action error: {0}")]
    Action(#[from] ActionError),

    /// Wraps a [`TokenAuthError`] so it can travel through `Result<_, EngineError>`
    /// call sites that don't use `RunOutcome` directly (e.g. collaborator clients).
    #[error(transparent)]
    TokenAuth(#[from] TokenAuthError),
}

/// Raised when a collaborator rejects the caller's token as expired or
/// invalid during the *first* attempt of an action within a run.
///
/// This is deliberately not a variant buried inside [`ActionError`]: spec §4.3
/// and §4.4 require it to escape the rule engine untouched so
/// [`crate::run::RunCoordinator`] can refresh credentials via the Identity
/// collaborator and re-drive the event exactly once (spec §8 invariant 10).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("token auth failed: {0}")]
pub struct TokenAuthError(pub String);

/// The outcome of a run, distinguishing a normal result from the one
/// propagating error the rule engine does not absorb.
#[derive(Debug)]
pub enum RunOutcome<T> {
    /// The run completed — successfully or with per-action failures already
    /// recorded inside `T`.
    Completed(T),
    /// `TokenAuthError` escaped the rule engine; the caller must refresh
    /// credentials and retry.
    TokenExpired(TokenAuthError),
}

impl<T> RunOutcome<T> {
    /// Returns the completed value, panicking if the run instead reported
    /// a token expiry. Intended for tests and call sites that have already
    /// handled the retry.
    #[must_use]
    pub fn expect_completed(self, msg: &str) -> T {
        match self {
            Self::Completed(v) => v,
            Self::TokenExpired(e) => panic!("{msg}: {e}"),
        }
    }
}
