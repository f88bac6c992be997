//! Session error types.

use thiserror::Error;

use capsync_captions::CaptionError;
use capsync_models::VideoIdError;
use capsync_storage::StorageError;
use capsync_translate::TranslateError;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid video reference: {0}")]
    VideoId(#[from] VideoIdError),

    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No video loaded")]
    NoVideo,
}
