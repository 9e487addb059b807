use thiserror::Error;

/// Error taxonomy for a sync pass.
///
/// Remote variants map directly to HTTP outcomes from the Clover API; the
/// retry policy for each lives in the orchestrator, not here.
#[derive(Error, Debug)]
pub enum SyncError {
    /// 401/403 from the remote API. Credentials are bad — never retried.
    #[error("remote authentication rejected: {0}")]
    RemoteAuth(String),

    /// 429 from the remote API. Signal only; cooldown happens upstream.
    #[error("remote rate limit hit: {0}")]
    RemoteRateLimit(String),

    /// Network failure or 5xx. Retried with the same policy as rate limits.
    #[error("transient remote failure: {0}")]
    RemoteTransient(String),

    /// Storage-layer fault. Fatal for the pass: the watermark must not
    /// advance if writes cannot be durably committed.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("no credentials registered for merchant {0}")]
    MissingCredentials(String),
}

impl SyncError {
    /// Whether the orchestrator may retry the failed sub-window once.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteRateLimit(_) | SyncError::RemoteTransient(_)
        )
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        use reqwest::StatusCode;

        match err.status() {
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => {
                SyncError::RemoteAuth(err.to_string())
            }
            Some(StatusCode::TOO_MANY_REQUESTS) => SyncError::RemoteRateLimit(err.to_string()),
            _ => SyncError::RemoteTransient(err.to_string()),
        }
    }
}
