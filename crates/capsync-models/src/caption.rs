//! Caption tracks, decoded captions and merged captions.

use serde::{Deserialize, Serialize};

/// 1-based caption identifier, assigned in document order.
pub type CaptionId = u32;

/// Origin of a caption track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// Authored by a person
    Manual,
    /// Produced by automatic speech recognition
    AutoGenerated,
}

impl TrackKind {
    pub fn is_auto_generated(self) -> bool {
        matches!(self, TrackKind::AutoGenerated)
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Manual => write!(f, "manual"),
            TrackKind::AutoGenerated => write!(f, "asr"),
        }
    }
}

/// A caption track chosen for one language of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language code as advertised by the manifest (e.g. `en`, `en-US`)
    pub language_code: String,
    /// Manual or auto-generated
    pub kind: TrackKind,
    /// Absolute URL of the timed-text document
    pub source_url: String,
}

impl CaptionTrack {
    pub fn new(language_code: impl Into<String>, kind: TrackKind, source_url: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            kind,
            source_url: source_url.into(),
        }
    }

    pub fn is_auto_generated(&self) -> bool {
        self.kind.is_auto_generated()
    }
}

/// A single decoded caption.
///
/// Invariant: `start_time < end_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub id: CaptionId,
    /// Start time in seconds
    pub start_time: f64,
    /// End time in seconds
    pub end_time: f64,
    pub text: String,
    /// Target-language text paired by the aligner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub is_auto_generated: bool,
}

impl Caption {
    pub fn new(
        id: CaptionId,
        start_time: f64,
        end_time: f64,
        text: impl Into<String>,
        is_auto_generated: bool,
    ) -> Self {
        Self {
            id,
            start_time,
            end_time,
            text: text.into(),
            translation: None,
            is_auto_generated,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A sentence-level caption made of one or more adjacent captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCaption {
    /// Id of the first member caption
    pub id: CaptionId,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub is_auto_generated: bool,
    /// Ids of the member captions, in order
    pub member_ids: Vec<CaptionId>,
}

impl MergedCaption {
    /// Whether `time` lies inside `[start_time, end_time)`.
    pub fn contains(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    pub fn has_translation(&self) -> bool {
        self.translation.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

impl From<&Caption> for MergedCaption {
    fn from(caption: &Caption) -> Self {
        Self {
            id: caption.id,
            start_time: caption.start_time,
            end_time: caption.end_time,
            text: caption.text.clone(),
            translation: caption.translation.clone(),
            is_auto_generated: caption.is_auto_generated,
            member_ids: vec![caption.id],
        }
    }
}
