//! Paginated history snapshots.

use std::sync::Arc;

use crate::{Backend, ConversationKey, Error, Message};

/// Fetches the most recent page of a conversation's history.
///
/// The loader itself is stateless: whether a snapshot is still wanted by
/// the time it arrives is the orchestrator's call, so a failed or stale
/// load never touches the store from here. No automatic retry.
pub struct HistoryLoader {
    backend: Arc<dyn Backend>,
    page_size: usize,
}

impl HistoryLoader {
    pub fn new(backend: Arc<dyn Backend>, page_size: usize) -> Self {
        Self { backend, page_size }
    }

    /// Load the most recent page for `key`, normalized ascending by
    /// timestamp. Ties keep the backend's order (stable sort).
    pub async fn load(&self, key: &ConversationKey) -> Result<Vec<Message>, Error> {
        let mut messages = self.backend.list_messages(key, self.page_size).await?;

        // The store must only ever hold records for this conversation
        messages.retain(|m| key.matches(&m.sender, &m.receiver));
        messages.sort_by_key(|m| m.at);

        log::debug!(
            "loaded {} history messages for conversation with {:?}",
            messages.len(),
            key.participants()
        );
        Ok(messages)
    }
}
