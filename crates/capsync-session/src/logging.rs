//! Structured logging for video loads.

use tracing::{info, warn, Span};
use uuid::Uuid;

/// Attaches a per-load id and the video id to every log line of one load.
#[derive(Debug, Clone)]
pub struct LoadLogger {
    load_id: String,
    video_id: String,
}

impl LoadLogger {
    pub fn new(video_id: &str) -> Self {
        Self {
            load_id: Uuid::new_v4().to_string(),
            video_id: video_id.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(load_id = %self.load_id, video_id = %self.video_id, "Load started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(load_id = %self.load_id, video_id = %self.video_id, "Load progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(load_id = %self.load_id, video_id = %self.video_id, "Load warning: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(load_id = %self.load_id, video_id = %self.video_id, "Load completed: {}", message);
    }

    pub fn load_id(&self) -> &str {
        &self.load_id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Span covering the whole load, so pipeline logs carry the ids too.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("video_load", load_id = %self.load_id, video_id = %self.video_id)
    }
}
