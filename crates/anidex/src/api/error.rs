use thiserror::Error;

/// Failure of a single outbound call
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },
}

/// Outcome of a queued request that did not produce a response
#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("request queue is closed")]
    Closed,
}

/// Errors from the typed Jikan client
#[derive(Debug, Error)]
pub enum JikanError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl JikanError {
    /// HTTP status of the upstream rejection, if the API answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            JikanError::Queue(QueueError::Transport(TransportError::Status { status, .. })) => {
                Some(*status)
            }
            _ => None,
        }
    }
}
