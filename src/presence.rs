//! Presence tracking via the user-collection subscription.
//!
//! Runs independently of conversation switches for the process lifetime:
//! - The roster is seeded once from a user listing (local user filtered)
//! - A single subscription over the user collection delivers `update`
//!   events; each one is applied in place to the matching roster entry
//! - Events for the local user's own id never change the roster

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::backend::RecordAction;
use crate::{Backend, Error, Profile, Roster};

/// Maintains the roster of other users and their online state.
pub struct PresenceTracker {
    roster: Arc<Mutex<Roster>>,
    task: Option<JoinHandle<()>>,
}

impl PresenceTracker {
    pub fn new(local_id: &str) -> Self {
        Self {
            roster: Arc::new(Mutex::new(Roster::new(local_id))),
            task: None,
        }
    }

    /// Seed the roster and begin consuming presence events.
    ///
    /// Restarting replaces the previous event task.
    pub async fn start(&mut self, backend: &Arc<dyn Backend>) -> Result<(), Error> {
        self.shutdown();

        let profiles = backend.list_profiles().await?;
        {
            let mut roster = self.roster.lock().await;
            roster.seed(profiles);
            log::debug!("presence roster seeded with {} users", roster.len());
        }

        let mut events = backend.subscribe_profiles().await?;
        let roster = Arc::clone(&self.roster);
        self.task = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                // Presence rides on record updates; creates and deletes
                // never alter roster membership
                if event.action != RecordAction::Update {
                    continue;
                }
                let mut roster = roster.lock().await;
                if roster.apply_update(event.record) {
                    log::debug!("presence updated, {} online", roster.online_count());
                }
            }
            // Stream ended; the roster freezes at its last known state
            log::warn!("presence subscription ended unexpectedly");
        }));
        Ok(())
    }

    /// Roster read view: online users first, stable within each group.
    pub async fn roster(&self) -> Vec<Profile> {
        self.roster.lock().await.sorted_view()
    }

    pub async fn online_count(&self) -> usize {
        self.roster.lock().await.online_count()
    }

    /// Stop consuming presence events. The roster keeps its last state.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
