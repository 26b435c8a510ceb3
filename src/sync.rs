//! Conversation sync orchestration.
//!
//! The orchestrator owns the active conversation key and sequences every
//! switch as: cancel the old subscription → mark in-flight loads stale →
//! clear the store → load history → open the new feed. The ordering is
//! the system's principal race hazard: a late history response for a
//! superseded key must never overwrite the store for the new key.
//!
//! Staleness is tracked with a generation counter bumped on every switch;
//! a response is applied only while its generation is still current, and
//! the check holds the state lock across the store mutation so a newer
//! switch cannot interleave.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    Backend, ConversationKey, Error, HistoryLoader, LiveFeed, Message, MessageDraft,
    MessageStore, PresenceTracker, Profile,
};

/// Tunables for the sync engine.
#[derive(Clone, Copy, Debug)]
pub struct SyncConfig {
    /// History page size per load.
    pub page_size: usize,
    /// After a successful send, refetch history for the authoritative
    /// view (`true`) or ingest the server echo optimistically (`false`).
    /// Refetching trades latency for consistency; both are valid.
    pub refetch_on_send: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { page_size: 50, refetch_on_send: true }
    }
}

/// Where the active conversation is in its lifecycle.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Loading,
    Subscribed,
}

#[derive(Default)]
struct SyncState {
    active: Option<ConversationKey>,
    /// Bumped on every switch; in-flight work carries the generation it
    /// started under and is discarded if the counter has moved on.
    generation: u64,
    phase: SyncPhase,
}

/// Owns the active conversation and routes history, live messages, and
/// presence into the shared state.
pub struct SyncOrchestrator {
    backend: Arc<dyn Backend>,
    local_id: String,
    config: SyncConfig,
    history: HistoryLoader,
    state: Mutex<SyncState>,
    store: Arc<Mutex<MessageStore>>,
    feed: Mutex<LiveFeed>,
    presence: Mutex<PresenceTracker>,
}

impl SyncOrchestrator {
    pub fn new(backend: Arc<dyn Backend>, local_id: &str, config: SyncConfig) -> Self {
        Self {
            history: HistoryLoader::new(Arc::clone(&backend), config.page_size),
            feed: Mutex::new(LiveFeed::new(Arc::clone(&backend))),
            presence: Mutex::new(PresenceTracker::new(local_id)),
            state: Mutex::new(SyncState::default()),
            store: Arc::new(Mutex::new(MessageStore::new())),
            backend,
            local_id: local_id.to_string(),
            config,
        }
    }

    /// Seed the roster and start consuming presence events. Presence runs
    /// independently of conversation switches for the process lifetime.
    pub async fn start(&self) -> Result<(), Error> {
        self.presence.lock().await.start(&self.backend).await
    }

    /// Make the conversation with `peer_id` the active one.
    ///
    /// Reselecting the already-active peer is a no-op. Otherwise the
    /// previous subscription is invalidated and in-flight loads are
    /// marked stale before any request for the new key is issued. A
    /// failed history load still opens the live feed and surfaces the
    /// error; the caller may re-trigger with [`refresh`](Self::refresh).
    pub async fn select_conversation(&self, peer_id: &str) -> Result<(), Error> {
        let key = ConversationKey::new(&self.local_id, peer_id);

        // Switch-over is atomic with respect to concurrent selects: the
        // old token is invalidated and the store cleared under the state
        // lock, before the first request on the new conversation's behalf
        let generation = {
            let mut state = self.state.lock().await;
            if state.active.as_ref() == Some(&key) {
                return Ok(());
            }
            state.active = Some(key.clone());
            state.generation += 1;
            state.phase = SyncPhase::Loading;
            self.feed.lock().await.unsubscribe();
            self.store.lock().await.clear();
            state.generation
        };

        let load_error = match self.history.load(&key).await {
            Ok(messages) => {
                let state = self.state.lock().await;
                if state.generation != generation {
                    // A newer selection owns the store now
                    log::debug!("discarding stale history response for {}", peer_id);
                    return Ok(());
                }
                self.store.lock().await.replace_all(messages);
                None
            }
            Err(e) => {
                log::warn!("history load for {} failed: {}", peer_id, e);
                Some(e)
            }
        };

        {
            // Lock order is always state, then feed
            let mut state = self.state.lock().await;
            if state.generation != generation {
                return Ok(());
            }
            let mut feed = self.feed.lock().await;
            feed.subscribe(key, Arc::clone(&self.store)).await?;
            state.phase = SyncPhase::Subscribed;
        }

        match load_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Send `content` to the active conversation's peer.
    ///
    /// Blank content (empty after trimming) is dropped before any backend
    /// call and reported as `Ok(false)`. If the create command fails the
    /// error propagates and nothing is ingested, so the caller can retry
    /// with the same content. Once the create has succeeded the send is
    /// reported as `Ok(true)` even if the follow-up refetch fails; the
    /// accepted message arrives on the next refresh or live echo.
    pub async fn send_message(&self, content: &str) -> Result<bool, Error> {
        let (key, generation) = {
            let state = self.state.lock().await;
            match &state.active {
                Some(key) => (key.clone(), state.generation),
                None => {
                    log::debug!("send ignored: no active conversation");
                    return Ok(false);
                }
            }
        };
        let peer = match key.other(&self.local_id) {
            Some(peer) => peer.to_string(),
            None => return Ok(false),
        };

        // Validation happens before any network call
        let draft = match MessageDraft::new(&self.local_id, &peer, content) {
            Some(draft) => draft,
            None => return Ok(false),
        };

        let accepted = self.backend.create_message(&draft).await?;

        if self.config.refetch_on_send {
            // Refetch the authoritative view rather than appending. The
            // message is already accepted at this point: a failed refetch
            // must not look like a failed send, or a retry would post it
            // twice under a fresh server id
            if let Err(e) = self.refresh().await {
                log::warn!("refresh after send failed: {}", e);
            }
        } else {
            let state = self.state.lock().await;
            if state.generation == generation {
                // The echo enters through the same dedup path as live events
                self.store.lock().await.ingest(accepted);
            }
        }
        Ok(true)
    }

    /// Reload history for the active conversation, if any.
    ///
    /// The snapshot is applied only if no switch happened while it was in
    /// flight; a stale snapshot is discarded, not an error.
    pub async fn refresh(&self) -> Result<(), Error> {
        let (key, generation) = {
            let state = self.state.lock().await;
            match &state.active {
                Some(key) => (key.clone(), state.generation),
                None => return Ok(()),
            }
        };

        let messages = self.history.load(&key).await?;

        let state = self.state.lock().await;
        if state.generation == generation {
            self.store.lock().await.replace_all(messages);
        } else {
            log::debug!("discarding stale history refresh");
        }
        Ok(())
    }

    /// Snapshot of the active conversation's messages, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.store.lock().await.messages().to_vec()
    }

    /// The peer of the active conversation, if one is selected.
    pub async fn active_peer(&self) -> Option<String> {
        let state = self.state.lock().await;
        state
            .active
            .as_ref()
            .and_then(|key| key.other(&self.local_id))
            .map(str::to_string)
    }

    pub async fn phase(&self) -> SyncPhase {
        self.state.lock().await.phase
    }

    /// Roster read view: online users first, stable within each group.
    pub async fn roster(&self) -> Vec<Profile> {
        self.presence.lock().await.roster().await
    }

    pub async fn online_count(&self) -> usize {
        self.presence.lock().await.online_count().await
    }

    /// Cancel every outstanding subscription and return to `Idle`.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock().await;
            self.feed.lock().await.unsubscribe();
            state.active = None;
            state.phase = SyncPhase::Idle;
            // In-flight loads become stale
            state.generation += 1;
        }
        self.presence.lock().await.shutdown();
    }
}
