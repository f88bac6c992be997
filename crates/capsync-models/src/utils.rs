//! Video id extraction from user-supplied URLs.

use thiserror::Error;

/// Errors that can occur during video id extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoIdError {
    #[error("URL is not a valid YouTube URL")]
    InvalidUrl,
    #[error("Video ID has invalid format")]
    InvalidVideoId,
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
}

/// Result type for video id extraction.
pub type VideoIdResult<T> = Result<T, VideoIdError>;

/// Length of a YouTube video id.
const VIDEO_ID_LEN: usize = 11;

/// Extract a YouTube video id from a URL or a bare id.
///
/// Supports:
/// - `https://youtube.com/watch?v=VIDEO_ID` (with or without `www.`/`m.`)
/// - `https://youtu.be/VIDEO_ID`
/// - `https://youtube.com/embed/VIDEO_ID`
/// - `https://youtube.com/v/VIDEO_ID`
/// - `https://youtube.com/shorts/VIDEO_ID`
/// - a bare 11-character id
pub fn extract_video_id(input: &str) -> VideoIdResult<String> {
    let input = input.trim();

    if input.len() == VIDEO_ID_LEN && is_valid_id_chars(input) {
        return Ok(input.to_string());
    }

    if !is_youtube_domain(input) {
        return Err(VideoIdError::InvalidUrl);
    }

    let markers = ["?v=", "&v=", "youtu.be/", "/embed/", "/v/", "/shorts/"];
    for marker in markers {
        if let Some(pos) = input.find(marker) {
            let remaining = &input[pos + marker.len()..];
            return validate_video_id(id_segment(remaining));
        }
    }

    Err(VideoIdError::VideoIdNotFound)
}

fn is_youtube_domain(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Cut a path/query segment at the first delimiter.
fn id_segment(segment: &str) -> &str {
    let end = segment
        .find(['&', '#', '?', '/'])
        .unwrap_or(segment.len());
    segment[..end].trim()
}

fn is_valid_id_chars(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_video_id(id: &str) -> VideoIdResult<String> {
    if id.is_empty() {
        return Err(VideoIdError::VideoIdNotFound);
    }
    if id.len() != VIDEO_ID_LEN || !is_valid_id_chars(id) {
        return Err(VideoIdError::InvalidVideoId);
    }
    Ok(id.to_string())
}
