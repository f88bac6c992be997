//! End-to-end caption loading for one video.
//!
//! Every failure degrades: a missing manifest yields no captions, an unusable
//! track contributes nothing, and whatever succeeded is still returned.

use std::sync::Arc;

use tracing::{info, warn};

use capsync_models::{Caption, CaptionTrack, LanguagePair};

use crate::aligner::align_by_index;
use crate::decoder::TimedTextDecoder;
use crate::fetch::Fetcher;
use crate::resolver::{CaptionSourceResolver, TrackSelection};
use crate::retry::RetryConfig;

/// Captions loaded for a video.
#[derive(Debug, Clone, Default)]
pub struct LoadedCaptions {
    pub video_id: String,
    /// Tracks that were chosen, whether or not they decoded
    pub selection: TrackSelection,
    /// Source-language captions with index-paired translations
    pub captions: Vec<Caption>,
}

impl LoadedCaptions {
    pub fn empty(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }
}

/// Resolver + decoder + aligner.
pub struct CaptionPipeline {
    resolver: CaptionSourceResolver,
    decoder: TimedTextDecoder,
    languages: LanguagePair,
}

impl CaptionPipeline {
    pub fn new(fetcher: Arc<dyn Fetcher>, languages: LanguagePair) -> Self {
        Self {
            resolver: CaptionSourceResolver::new(fetcher.clone()),
            decoder: TimedTextDecoder::new(fetcher),
            languages,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.resolver = self.resolver.with_retry(retry);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_origin(origin);
        self
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    /// Load aligned captions for a video. Never fails.
    pub async fn load(&self, video_id: &str) -> LoadedCaptions {
        let selection = match self.resolver.resolve(video_id, &self.languages).await {
            Ok(selection) => selection,
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "No caption manifest, continuing without captions");
                return LoadedCaptions::empty(video_id);
            }
        };

        // Both tracks are fetched concurrently; alignment waits for both.
        let (source, target) = tokio::join!(
            self.decode_optional(selection.source.as_ref()),
            self.decode_optional(selection.target.as_ref()),
        );

        let captions = align_by_index(source, &target);

        info!(
            video_id = %video_id,
            captions = captions.len(),
            translated = captions.iter().filter(|c| c.translation.is_some()).count(),
            "Loaded captions"
        );

        LoadedCaptions {
            video_id: video_id.to_string(),
            selection,
            captions,
        }
    }

    async fn decode_optional(&self, track: Option<&CaptionTrack>) -> Vec<Caption> {
        let Some(track) = track else {
            return Vec::new();
        };

        match self.decoder.decode_track(track).await {
            Ok(captions) => captions,
            Err(e) => {
                warn!(language = %track.language_code, error = %e, "Caption track unusable, using empty track");
                Vec::new()
            }
        }
    }
}
