//! Caption acquisition error types.

use thiserror::Error;

pub type CaptionResult<T> = Result<T, CaptionError>;

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Caption manifest not found: {0}")]
    ManifestNotFound(String),

    #[error("Caption track unusable: {0}")]
    TrackUnusable(String),

    #[error("Fetch failed for {url}: {message}")]
    FetchFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaptionError {
    pub fn manifest_not_found(msg: impl Into<String>) -> Self {
        Self::ManifestNotFound(msg.into())
    }

    pub fn track_unusable(msg: impl Into<String>) -> Self {
        Self::TrackUnusable(msg.into())
    }

    pub fn fetch_failed(url: impl Into<String>, status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.into(),
            status,
            message: msg.into(),
        }
    }

    /// HTTP status of a failed fetch, when one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CaptionError::FetchFailed { status, .. } => *status,
            CaptionError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
