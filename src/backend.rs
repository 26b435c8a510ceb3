//! Backend collaborator interface.
//!
//! The sync core never talks to the record backend directly; everything
//! goes through the [`Backend`] trait, owned by the orchestrator as an
//! explicit connection object rather than an ambient singleton client.
//!
//! The backend contract consumed here:
//! - Query: list messages matching the symmetric two-party predicate,
//!   paginated, ordered by creation time
//! - Command: create a message; the backend assigns id and timestamp
//! - Query: list users (roster seed)
//! - Subscription: a push stream of `{action, record}` events per
//!   collection; the core consumes `create` events for messages and
//!   `update` events for users

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::{ConversationKey, Error, Message, MessageDraft, Profile};

/// What happened to a record on the backend.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    Create,
    Update,
    Delete,
}

/// One event from a collection subscription.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RecordEvent<T> {
    pub action: RecordAction,
    pub record: T,
}

/// A live stream of record events for one collection.
pub type EventStream<T> = BoxStream<'static, RecordEvent<T>>;

/// Connection to the record backend.
///
/// Implementations are expected to map transport failures to
/// [`Error::Network`] and to end their event streams when the underlying
/// connection drops; the core logs a dropped stream but does not
/// resubscribe.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The most recent `limit` messages of the conversation, in the
    /// backend's creation order.
    async fn list_messages(
        &self,
        key: &ConversationKey,
        limit: usize,
    ) -> Result<Vec<Message>, Error>;

    /// Create a message record; returns the accepted record with its
    /// server-assigned id and timestamp.
    async fn create_message(&self, draft: &MessageDraft) -> Result<Message, Error>;

    /// All user records, local user included (the roster filters it out).
    async fn list_profiles(&self) -> Result<Vec<Profile>, Error>;

    /// Open a live stream over the message collection.
    async fn subscribe_messages(&self) -> Result<EventStream<Message>, Error>;

    /// Open a live stream over the user collection.
    async fn subscribe_profiles(&self) -> Result<EventStream<Profile>, Error>;
}
