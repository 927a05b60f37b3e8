//! Error types for media server calls.

use thiserror::Error;

/// Errors from talking to the media server.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Server rejected request: {status} {reason}")]
    Rejected { status: u16, reason: String },

    #[error("Request failed: {0}")]
    Transport(reqwest::Error),

    #[error("Failed to parse section list: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for RefreshError {
    fn from(e: reqwest::Error) -> Self {
        // The URL carries the token in its query string
        RefreshError::Transport(e.without_url())
    }
}
