//! Conversation identity and the in-memory message store.

use serde::{Deserialize, Serialize};

use crate::Message;

/// Identity of a two-party message scope.
///
/// The pair is unordered: `new("alice", "bob")` and `new("bob", "alice")`
/// are equal. The participants are normalized at construction so equality
/// and hashing fall out of the derived impls.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    a: String,
    b: String,
}

impl ConversationKey {
    pub fn new(first: &str, second: &str) -> Self {
        // Normalize so the unordered pair has a single representation
        if first <= second {
            Self { a: first.to_string(), b: second.to_string() }
        } else {
            Self { a: second.to_string(), b: first.to_string() }
        }
    }

    /// The symmetric predicate: does a record addressed `sender -> receiver`
    /// belong to this conversation?
    pub fn matches(&self, sender: &str, receiver: &str) -> bool {
        (sender == self.a && receiver == self.b) || (sender == self.b && receiver == self.a)
    }

    /// Get the other participant for a given local user.
    pub fn other(&self, my_id: &str) -> Option<&str> {
        if my_id == self.a {
            Some(&self.b)
        } else if my_id == self.b {
            Some(&self.a)
        } else {
            None
        }
    }

    pub fn participants(&self) -> (&str, &str) {
        (&self.a, &self.b)
    }
}

/// Ordered, deduplicated message collection for the current conversation.
///
/// `ingest` is the single entry point for both history results and live
/// events: history and live messages may arrive in either order relative
/// to each other, and idempotent insertion is what makes the store
/// converge to the same duplicate-free, time-ordered sequence regardless.
#[derive(Clone, Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    /// Add a message, preserving ascending timestamp order.
    ///
    /// Returns `false` without touching the store if the id is already
    /// present. Equal timestamps keep arrival order.
    pub fn ingest(&mut self, message: Message) -> bool {
        // Make sure we don't add the same message twice
        if self.messages.iter().any(|m| m.id == message.id) {
            // Message is already known by the store
            return false;
        }

        // Fast path for the common case: the newest message (append to end)
        if self.messages.last().is_none_or(|last| message.at >= last.at) {
            self.messages.push(message);
        } else {
            // Upper bound keeps earlier arrivals ahead of equal timestamps
            let idx = self.messages.partition_point(|m| m.at <= message.at);
            self.messages.insert(idx, message);
        }
        true
    }

    /// Swap the held collection for a fresh history snapshot.
    ///
    /// Replayed through `ingest` so a snapshot with duplicate or
    /// out-of-order records still lands deduplicated and time-ordered.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages.clear();
        for message in messages {
            self.ingest(message);
        }
    }

    /// Empty the store. The store itself survives conversation switches.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last message timestamp
    pub fn last_message_time(&self) -> Option<u64> {
        self.messages.last().map(|msg| msg.at)
    }
}
