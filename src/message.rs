//! Message types.

use serde::{Deserialize, Serialize};

/// A message record as held by the backend.
///
/// Records are immutable once created: the backend assigns `id` and the
/// `created_at` timestamp, and the core never edits or deletes them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    /// Unix milliseconds, assigned by the backend.
    #[serde(rename = "createdAt")]
    pub at: u64,
}

impl Message {
    /// Whether this message was sent by the given local user.
    pub fn mine(&self, local_id: &str) -> bool {
        self.sender == local_id
    }
}

/// An outgoing message before the backend has accepted it.
///
/// No `id` or timestamp yet; both are assigned server-side. Construction
/// trims the content and refuses blank drafts, so a draft that exists is
/// always sendable.
#[derive(Serialize, Clone, Debug)]
pub struct MessageDraft {
    pub sender: String,
    pub receiver: String,
    pub content: String,
}

impl MessageDraft {
    /// Build a draft, rejecting content that is empty after trimming.
    pub fn new(sender: &str, receiver: &str, content: &str) -> Option<Self> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            content: trimmed.to_string(),
        })
    }
}
