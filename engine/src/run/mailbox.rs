//! Per-conversation mailbox (spec §5 "Per-conversation serialization",
//! "Backpressure").
//!
//! Writes to `(conversationState, contextMap)` and the emission order of
//! outbound messages for one conversation must be serialized, while distinct
//! conversations proceed in parallel without contention. A `DashMap`-keyed
//! `tokio::sync::Mutex<()>` gives each conversation its own lock, acquired
//! for the duration of one [`enqueue`](Mailbox::enqueue) call; a sibling
//! `DashMap`-keyed depth counter rejects enqueues past the bounded depth
//! before they ever wait on the lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::EngineError;

/// Default bounded mailbox depth (spec §5: "bounded depth (default 256)").
pub const DEFAULT_MAILBOX_DEPTH: usize = 256;

/// Serializes work per `conversationId` and rejects enqueues once a
/// conversation's in-flight depth reaches its bound.
pub struct Mailbox {
    depth: usize,
    locks: DashMap<String, Arc<Mutex<()>>>,
    pending: DashMap<String, AtomicUsize>,
}

impl Mailbox {
    /// Build a mailbox with the given bounded depth per conversation.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            locks: DashMap::new(),
            pending: DashMap::new(),
        }
    }

    /// Run `f` with exclusive access to `conversation_id`'s mailbox,
    /// serialized against any other in-flight call for the same
    /// conversation. Returns [`EngineError::MailboxOverloaded`] without
    /// running `f` if the conversation's pending depth is already at its
    /// bound (spec §5 "enqueue beyond that returns an 'overloaded' error").
    pub async fn enqueue<F, Fut, T>(&self, conversation_id: &str, f: F) -> Result<T, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let counter = self
            .pending
            .entry(conversation_id.to_string())
            .or_insert_with(|| AtomicUsize::new(0));
        let previous = counter.fetch_add(1, Ordering::AcqRel);
        if previous >= self.depth {
            counter.fetch_sub(1, Ordering::AcqRel);
            return Err(EngineError::MailboxOverloaded(conversation_id.to_string()));
        }
        drop(counter);

        let lock = self
            .locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;
        let result = f().await;

        if let Some(counter) = self.pending.get(conversation_id) {
            counter.fetch_sub(1, Ordering::AcqRel);
        }
        Ok(result)
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_DEPTH)
    }
}
