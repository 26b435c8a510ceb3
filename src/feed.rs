//! Live message feed: one cancellable subscription per active conversation.
//!
//! Cancellation model:
//! - Every subscription hands out a [`FeedToken`]; flipping it to
//!   `Invalidated` is synchronous and happens before any request for a
//!   new conversation is issued
//! - The delivery task checks token validity as its first action for each
//!   event, so a delivery already queued when the token flips is
//!   suppressed instead of touching the store
//! - At most one valid token is outstanding per feed: subscribing again
//!   cancels the previous subscription first
//!
//! A stream that ends on its own has no reconnect policy; the feed logs
//! the drop and degrades silently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::backend::RecordAction;
use crate::{Backend, ConversationKey, Error, MessageStore};

/// Validity of a subscription token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Invalidated,
}

/// Cancellation handle for one live event stream.
///
/// Cloned into the delivery task; invalidation is observed by every
/// clone.
#[derive(Clone, Debug)]
pub struct FeedToken {
    invalidated: Arc<AtomicBool>,
}

impl FeedToken {
    fn new() -> Self {
        Self { invalidated: Arc::new(AtomicBool::new(false)) }
    }

    pub fn state(&self) -> TokenState {
        if self.invalidated.load(Ordering::SeqCst) {
            TokenState::Invalidated
        } else {
            TokenState::Valid
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state() == TokenState::Valid
    }

    /// Flip the token to `Invalidated`. Irreversible.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }
}

struct ActiveFeed {
    key: ConversationKey,
    token: FeedToken,
    task: JoinHandle<()>,
}

/// Manages the single live message subscription for the active
/// conversation, routing matching create events into the store.
pub struct LiveFeed {
    backend: Arc<dyn Backend>,
    active: Option<ActiveFeed>,
}

impl LiveFeed {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend, active: None }
    }

    /// Open a subscription for `key`, cancelling any previous one first.
    ///
    /// Create events matching the key's symmetric predicate are ingested
    /// into `store`; everything else is skipped.
    pub async fn subscribe(
        &mut self,
        key: ConversationKey,
        store: Arc<Mutex<MessageStore>>,
    ) -> Result<FeedToken, Error> {
        // Never more than one valid token outstanding
        self.unsubscribe();

        let mut events = self.backend.subscribe_messages().await?;
        let token = FeedToken::new();

        let task_token = token.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                // Token validity comes first: a delivery queued behind a
                // cancellation must never touch the store
                if !task_token.is_valid() {
                    break;
                }
                if event.action != RecordAction::Create {
                    continue;
                }
                let message = event.record;
                if !task_key.matches(&message.sender, &message.receiver) {
                    continue;
                }

                let mut store = store.lock().await;
                // The key may have been switched while waiting for the lock
                if !task_token.is_valid() {
                    break;
                }
                if store.ingest(message) {
                    log::debug!(
                        "live message ingested for conversation with {:?}",
                        task_key.participants()
                    );
                }
            }

            if task_token.is_valid() {
                // The stream ended on its own; no reconnect policy exists
                log::warn!(
                    "live feed for conversation with {:?} ended unexpectedly",
                    task_key.participants()
                );
            }
        });

        self.active = Some(ActiveFeed { key, token: token.clone(), task });
        Ok(token)
    }

    /// Invalidate and tear down the current subscription, if any.
    pub fn unsubscribe(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.invalidate();
            active.task.abort();
            log::debug!(
                "live feed for conversation with {:?} cancelled",
                active.key.participants()
            );
        }
    }

    /// The token of the current subscription, if one is open.
    pub fn token(&self) -> Option<&FeedToken> {
        self.active.as_ref().map(|a| &a.token)
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
