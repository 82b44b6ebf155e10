use std::sync::Arc;
use thiserror::Error;

/// The provider could not deliver usable data.
///
/// Transport errors are kept behind an `Arc` so the error stays `Clone`.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Network request failed for {url}")]
    NetworkRequest {
        url: String,
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed payload from {url}: {message}")]
    MalformedPayload { url: String, message: String },

    #[error("Upstream limiter was shut down")]
    LimiterClosed,

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
}

impl UpstreamError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            UpstreamError::HttpStatus {
                url: url.to_string(),
                status,
            }
        } else {
            UpstreamError::NetworkRequest {
                url: url.to_string(),
                source: Arc::new(err),
            }
        }
    }

    pub(crate) fn malformed(url: &str, message: impl Into<String>) -> Self {
        UpstreamError::MalformedPayload {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
