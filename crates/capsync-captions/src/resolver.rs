//! Caption source resolution: page fetch, manifest location, track selection.

use std::sync::Arc;

use tracing::{debug, info, warn};

use capsync_models::{CaptionTrack, LanguagePair};

use crate::error::{CaptionError, CaptionResult};
use crate::fetch::Fetcher;
use crate::locator::{locate_caption_tracks, DEFAULT_ORIGIN};
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// The tracks chosen for one video load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSelection {
    /// Track in the spoken language
    pub source: Option<CaptionTrack>,
    /// Track in the translation language
    pub target: Option<CaptionTrack>,
}

impl TrackSelection {
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.target.is_none()
    }

    /// Chosen tracks, source first.
    pub fn tracks(&self) -> Vec<CaptionTrack> {
        self.source.iter().chain(self.target.iter()).cloned().collect()
    }
}

/// Choose at most one track per language of interest.
///
/// A manual track always wins over an auto-generated one for the same
/// language, wherever it appears in the manifest. Among tracks of the same
/// kind the first listed wins.
pub fn select_tracks(tracks: &[CaptionTrack], languages: &LanguagePair) -> TrackSelection {
    TrackSelection {
        source: best_track(tracks, |code| languages.is_source(code)),
        target: best_track(tracks, |code| languages.is_target(code)),
    }
}

fn best_track(tracks: &[CaptionTrack], matches_language: impl Fn(&str) -> bool) -> Option<CaptionTrack> {
    let mut fallback: Option<&CaptionTrack> = None;

    for track in tracks.iter().filter(|t| matches_language(&t.language_code)) {
        if !track.is_auto_generated() {
            return Some(track.clone());
        }
        if fallback.is_none() {
            fallback = Some(track);
        }
    }

    fallback.cloned()
}

/// Locates and selects caption tracks for a video.
pub struct CaptionSourceResolver {
    fetcher: Arc<dyn Fetcher>,
    retry: RetryConfig,
    origin: String,
}

impl CaptionSourceResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            retry: RetryConfig::new("caption_manifest"),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }

    /// Override the page-fetch retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the site origin (watch page and relative track URLs).
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    pub fn watch_url(&self, video_id: &str) -> String {
        format!("{}/watch?v={}", self.origin, video_id)
    }

    /// Fetch the watch page and return every caption track it lists.
    ///
    /// Page fetch failures and pages without a manifest are retried; after the
    /// last attempt the error is `ManifestNotFound`.
    pub async fn list_tracks(&self, video_id: &str) -> CaptionResult<Vec<CaptionTrack>> {
        let url = self.watch_url(video_id);

        let result = retry_async(&self.retry, |attempt| {
            let url = url.clone();
            async move {
                debug!(video_id = %video_id, attempt, "Fetching watch page");
                let page = self.fetcher.fetch(&url).await?;
                locate_caption_tracks(&page)
            }
        })
        .await;

        let descriptors = match result {
            RetryResult::Success(descriptors) => descriptors,
            RetryResult::Failed { error, attempts } => {
                return Err(CaptionError::manifest_not_found(format!(
                    "video {} after {} attempts: {}",
                    video_id, attempts, error
                )));
            }
        };

        let tracks = descriptors
            .iter()
            .filter_map(|descriptor| match descriptor.to_track(&self.origin) {
                Ok(track) => Some(track),
                Err(e) => {
                    warn!(
                        language = %descriptor.language_code,
                        error = %e,
                        "Skipping caption track with unusable URL"
                    );
                    None
                }
            })
            .collect();

        Ok(tracks)
    }

    /// Resolve the source and target tracks for a video.
    pub async fn resolve(&self, video_id: &str, languages: &LanguagePair) -> CaptionResult<TrackSelection> {
        let tracks = self.list_tracks(video_id).await?;
        let selection = select_tracks(&tracks, languages);

        info!(
            video_id = %video_id,
            available = tracks.len(),
            source = ?selection.source.as_ref().map(|t| t.kind),
            target = ?selection.target.as_ref().map(|t| t.kind),
            "Resolved caption tracks"
        );

        Ok(selection)
    }
}
