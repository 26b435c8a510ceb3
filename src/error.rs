//! Error types for the sync core.

/// Faults surfaced by the sync core.
///
/// Validation failures (blank message drafts) and stale responses are not
/// errors: the former is a silent no-op before any network call, the
/// latter is discarded on arrival by design. Everything here is retryable
/// by the caller; nothing in the core retries automatically.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend query or command failed; state was left unchanged.
    #[error("backend request failed: {0}")]
    Network(String),

    /// A live subscription could not be opened.
    #[error("subscription failed: {0}")]
    Subscribe(String),
}
