//! Courier sync core.
//!
//! This crate is the single source of truth for two-party conversation
//! state across Courier clients. It keeps a client's view of the active
//! conversation consistent while:
//! - Loading a paginated history snapshot
//! - Receiving a live push stream of new messages
//! - Deduplicating and time-ordering the two sources
//! - Reconciling presence updates pushed independently of message traffic
//!
//! Conversation switches cancel stale work: the previous live subscription
//! is invalidated before any request for the new conversation is issued,
//! and late history responses for a superseded conversation are discarded
//! on arrival.
//!
//! UI shells, session bootstrap, and the record backend itself are out of
//! scope; the backend is consumed through the [`Backend`] trait.

pub mod backend;
pub mod conversation;
pub mod error;
pub mod feed;
pub mod history;
pub mod message;
pub mod presence;
pub mod profile;
pub mod sync;

pub use backend::{Backend, EventStream, RecordAction, RecordEvent};
pub use conversation::{ConversationKey, MessageStore};
pub use error::Error;
pub use feed::{FeedToken, LiveFeed, TokenState};
pub use history::HistoryLoader;
pub use message::{Message, MessageDraft};
pub use presence::PresenceTracker;
pub use profile::{Profile, Roster};
pub use sync::{SyncConfig, SyncOrchestrator, SyncPhase};
