//! Translation error types.
//!
//! These never reach the caption timeline: the `Translator` trait turns them
//! into an absent translation.

use thiserror::Error;

use capsync_storage::StorageError;

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Translation service returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Translation rejected ({status}): {details}")]
    Rejected { status: String, details: String },

    #[error("Empty translation")]
    Empty,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache storage error: {0}")]
    Storage(#[from] StorageError),
}

impl TranslateError {
    pub fn rejected(status: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Rejected {
            status: status.into(),
            details: details.into(),
        }
    }
}
