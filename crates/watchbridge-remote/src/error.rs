use thiserror::Error;

/// Failure taxonomy for remote-service calls. Callers decide scope: the
/// scrobbler treats everything here as non-fatal during playback, the sync
/// engine counts and continues per item or per category.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Timeout or connection failure. No immediate retry; the next
    /// heartbeat or sync pass retries naturally.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401 that survived one token refresh, or a refresh that produced the
    /// same token. Permanent for this call.
    #[error("authorization expired and token refresh did not help")]
    AuthExpired,

    /// 429. Immediate failure, never retried.
    #[error("rate limited by the remote service")]
    RateLimited,

    /// 404. Failure for this one call only.
    #[error("remote has no matching record")]
    NotFound,

    /// 5xx or other unexpected status.
    #[error("remote service error (HTTP {0})")]
    Server(u16),

    /// Response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether the failure is expected to clear on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transport(_) | RemoteError::Server(_))
    }
}

/// Failures from the local media library adapter. A rejected write skips the
/// item, is counted, and the pass continues.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON-RPC error: {0}")]
    Rpc(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}
