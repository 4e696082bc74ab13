use thiserror::Error;

/// Errors raised while building or submitting an alert.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Failure reported by the HTTP client, passed through untouched. Covers
    /// connection failures, invalid URLs and non-success statuses.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("failed to serialize alert document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no matches to alert on")]
    NoMatches,
}

impl AlertError {
    /// The underlying transport error, if this is one.
    pub fn as_transport(&self) -> Option<&reqwest::Error> {
        match self {
            AlertError::Transport(err) => Some(err),
            _ => None,
        }
    }
}
