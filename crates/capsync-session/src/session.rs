//! One-video-at-a-time caption session.
//!
//! Loading a video first tears down everything that belonged to the previous
//! one (sampler, translation worker, queue and synchronizer state), then
//! runs the caption pipeline, merges the result and prepares a stopped
//! sampler and worker over the new timeline.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{warn, Instrument};

use capsync_captions::{CaptionPipeline, Fetcher, HttpFetcher, HttpFetcherConfig};
use capsync_models::{extract_video_id, Caption, CaptionId, CaptionTrack, MergedCaption};
use capsync_storage::{JsonFileStore, KeyValueStore};
use capsync_timeline::{ActiveCaptionChange, MediaPlayer, PlaybackSampler, SentenceMerger};
use capsync_translate::{
    CachingTranslator, MyMemoryTranslator, TranslationCache, TranslationUpdate, TranslationWorker, Translator,
};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::logging::LoadLogger;

/// Key holding the id of the most recently loaded video.
pub const LAST_VIDEO_KEY: &str = "last_video";

fn tracks_key(video_id: &str) -> String {
    format!("tracks_{}", video_id)
}

/// Result of loading a video.
#[derive(Debug)]
pub struct LoadedVideo {
    pub video_id: String,
    pub tracks: Vec<CaptionTrack>,
    pub timeline: Arc<[MergedCaption]>,
    /// Active-caption changes from sampling and seeks
    pub caption_events: mpsc::UnboundedReceiver<ActiveCaptionChange>,
    /// Backfilled translations as they arrive
    pub translation_updates: mpsc::UnboundedReceiver<TranslationUpdate>,
}

struct ActiveVideo {
    video_id: String,
    timeline: Arc<[MergedCaption]>,
    sampler: PlaybackSampler,
    worker: TranslationWorker,
}

pub struct CaptionSession {
    config: SessionConfig,
    pipeline: CaptionPipeline,
    merger: SentenceMerger,
    translator: Arc<dyn Translator>,
    player: Arc<dyn MediaPlayer>,
    store: Arc<dyn KeyValueStore>,
    active: Option<ActiveVideo>,
}

impl CaptionSession {
    /// Build a session from its collaborators. `translator` is wrapped with
    /// normalization and the persistent translation cache.
    pub fn new(
        config: SessionConfig,
        fetcher: Arc<dyn Fetcher>,
        translator: Arc<dyn Translator>,
        player: Arc<dyn MediaPlayer>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let pipeline = CaptionPipeline::new(fetcher, config.languages.clone()).with_retry(config.retry_config());
        let merger = SentenceMerger::new(config.merge.clone());
        let cache = TranslationCache::new(store.clone()).with_ttl(config.cache_ttl);
        let translator: Arc<dyn Translator> = Arc::new(CachingTranslator::new(translator, cache));

        Self {
            config,
            pipeline,
            merger,
            translator,
            player,
            store,
            active: None,
        }
    }

    /// Build a session with the HTTP fetcher, the MyMemory client and a
    /// JSON state file.
    pub fn from_config(config: SessionConfig, player: Arc<dyn MediaPlayer>) -> SessionResult<Self> {
        let fetcher = Arc::new(HttpFetcher::new(HttpFetcherConfig::default())?);
        let translator = Arc::new(MyMemoryTranslator::new(config.mymemory_config())?);
        let store = Arc::new(JsonFileStore::new(config.state_file.clone()));

        Ok(Self::new(config, fetcher, translator, player, store))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn video_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.video_id.as_str())
    }

    pub fn timeline(&self) -> Option<Arc<[MergedCaption]>> {
        self.active.as_ref().map(|a| a.timeline.clone())
    }

    /// Load a video from a URL or a bare id.
    pub async fn load_url(&mut self, input: &str) -> SessionResult<LoadedVideo> {
        let video_id = extract_video_id(input)?;
        Ok(self.load_video(&video_id).await)
    }

    /// Load captions for a video, replacing whatever was loaded before.
    ///
    /// Caption failures degrade to an empty timeline; this never fails.
    pub async fn load_video(&mut self, video_id: &str) -> LoadedVideo {
        let logger = LoadLogger::new(video_id);
        let span = logger.create_span();

        async {
            self.unload().await;
            logger.log_start("fetching caption tracks");

            let loaded = self.pipeline.load(video_id).await;
            let tracks = loaded.selection.tracks();
            if loaded.is_empty() {
                logger.log_warning("no usable captions");
            }

            let captions: Arc<[Caption]> = loaded.captions.into();
            let timeline = self.merger.merge(&captions);
            logger.log_progress(&format!("{} captions merged into {} entries", captions.len(), timeline.len()));

            let (sampler, caption_events) =
                PlaybackSampler::new(self.player.clone(), timeline.clone(), self.config.sampler_config());
            let (worker, translation_updates) =
                TranslationWorker::new(self.translator.clone(), self.config.worker_config());
            worker.reset(timeline.clone()).await;

            self.persist_state(video_id, &tracks).await;

            self.active = Some(ActiveVideo {
                video_id: video_id.to_string(),
                timeline: timeline.clone(),
                sampler,
                worker,
            });
            logger.log_completion(&format!("{} tracks", tracks.len()));

            LoadedVideo {
                video_id: video_id.to_string(),
                tracks,
                timeline,
                caption_events,
                translation_updates,
            }
        }
        .instrument(span)
        .await
    }

    /// Stop background work for the current video and forget it.
    pub async fn unload(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.sampler.stop().await;
            active.worker.stop().await;
        }
    }

    /// Start sampling playback and backfilling translations.
    pub fn play(&mut self) -> SessionResult<()> {
        let active = self.active.as_mut().ok_or(SessionError::NoVideo)?;
        active.sampler.start();
        active.worker.start(active.sampler.position());
        Ok(())
    }

    /// Stop sampling and backfilling, keeping the loaded video.
    pub async fn pause(&mut self) -> SessionResult<()> {
        let active = self.active.as_mut().ok_or(SessionError::NoVideo)?;
        active.sampler.stop().await;
        active.worker.stop().await;
        Ok(())
    }

    /// Stop sampling and backfilling and return to the start of the video.
    /// Translations fetched so far are kept.
    pub async fn rewind(&mut self) -> SessionResult<()> {
        let active = self.active.as_mut().ok_or(SessionError::NoVideo)?;
        active.sampler.stop().await;
        active.worker.stop().await;
        active.sampler.reset(active.timeline.clone()).await;
        self.player.seek_to(0.0).await;
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.sampler.is_running())
    }

    /// Seek the player and report the caption at the new position.
    pub async fn seek(&self, time: f64) -> SessionResult<ActiveCaptionChange> {
        let active = self.active.as_ref().ok_or(SessionError::NoVideo)?;
        Ok(active.sampler.seek(time).await)
    }

    pub async fn active_caption(&self) -> Option<MergedCaption> {
        self.active.as_ref()?.sampler.active().await
    }

    /// Translate captions around `time` now, without a running loop.
    pub async fn backfill(&self, time: f64) -> SessionResult<usize> {
        let active = self.active.as_ref().ok_or(SessionError::NoVideo)?;
        Ok(active.worker.run_pass(time).await)
    }

    /// Bundled translation if the track had one, otherwise a backfilled one.
    pub async fn translation_for(&self, caption_id: CaptionId) -> Option<String> {
        let active = self.active.as_ref()?;
        let bundled = active
            .timeline
            .iter()
            .find(|c| c.id == caption_id)
            .filter(|c| c.has_translation())
            .and_then(|c| c.translation.clone());

        match bundled {
            Some(translation) => Some(translation),
            None => active.worker.translation(caption_id).await,
        }
    }

    /// Id of the most recently loaded video, from persisted state.
    pub async fn last_video(&self) -> SessionResult<Option<String>> {
        Ok(self.store.get(LAST_VIDEO_KEY).await?)
    }

    /// Tracks chosen the last time a video was loaded.
    pub async fn saved_tracks(&self, video_id: &str) -> SessionResult<Vec<CaptionTrack>> {
        match self.store.get(&tracks_key(video_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn persist_state(&self, video_id: &str, tracks: &[CaptionTrack]) {
        if let Err(e) = self.store.set(LAST_VIDEO_KEY, video_id.to_string()).await {
            warn!(video_id = %video_id, error = %e, "Failed to persist last video");
        }

        let tracks_json = match serde_json::to_string(tracks) {
            Ok(json) => json,
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Failed to serialize chosen tracks");
                return;
            }
        };
        if let Err(e) = self.store.set(&tracks_key(video_id), tracks_json).await {
            warn!(video_id = %video_id, error = %e, "Failed to persist chosen tracks");
        }
    }
}
