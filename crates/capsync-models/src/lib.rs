//! Shared data models for capsync.
//!
//! This crate provides Serde-serializable types for:
//! - Caption tracks and decoded captions
//! - Sentence-level merged captions
//! - Language selection for bilingual playback
//! - Video id extraction and timestamp formatting

pub mod caption;
pub mod language;
pub mod timestamp;
pub mod utils;

// Re-export common types
pub use caption::{Caption, CaptionId, CaptionTrack, MergedCaption, TrackKind};
pub use language::{primary_subtag, LanguagePair};
pub use timestamp::{format_clock, format_seconds};
pub use utils::{extract_video_id, VideoIdError, VideoIdResult};
