//! Error type for the outbound HTTP client.

use thiserror::Error;

/// Errors raised by [`HttpClient`](super::HttpClient).
#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL is blank or unparsable; no request was attempted.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl {
        /// URL as given.
        url: String,
        /// Parser message.
        reason: String,
    },
    /// No response was obtained.
    #[error("request to {url} failed: {reason}")]
    Exchange {
        /// URL as given.
        url: String,
        /// Transport message.
        reason: String,
    },
    /// A JSON body could not be encoded or decoded.
    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),
}

impl HttpError {
    pub(crate) fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }
}
