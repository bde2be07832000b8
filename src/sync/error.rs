use thiserror::Error;

/// Failure taxonomy of the backend tiers. None of these is fatal to a user
/// flow: every call site has a fallback terminus, and the local in-memory
/// tier never fails.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No credentials for this tier. A routing signal, not a failure.
    #[error("backend not configured")]
    Unconfigured,

    /// Network, authorization or server-side error on a backend call.
    #[error("backend call failed: {0}")]
    Backend(String),

    /// The backend answered, but the payload did not decode.
    #[error("malformed backend response: {0}")]
    Decode(String),

    #[error("record not found or already processed: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Backend(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Backend(err.to_string())
    }
}
