//! API client error types.

use thiserror::Error;

/// Errors that can occur while talking to the digest service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never got a response.
    #[error("Connection error: {0}")]
    Transport(String),

    /// The service refused the payload (HTTP 400).
    #[error("{message}")]
    Rejected { message: String },

    /// Any other non-success status.
    #[error("Server returned status {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body was not a digest record.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}
