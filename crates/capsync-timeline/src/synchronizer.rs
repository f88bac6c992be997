//! Active-caption tracking against a playback position.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use capsync_models::{CaptionId, MergedCaption};

/// Sample movements smaller than this are ignored.
pub const DEFAULT_DEBOUNCE_SECS: f64 = 0.05;

/// What the synchronizer last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveCaptionState {
    pub current_id: Option<CaptionId>,
    /// Time of the last sample that was processed, not merely received
    pub last_sampled_time: Option<f64>,
}

/// Source of an active-caption change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCause {
    Sample,
    Seek,
}

/// Whether a change made a caption active or left the timeline in a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Entered,
    Cleared,
}

/// Notification that the active caption changed (or was re-reported on seek).
///
/// Entering a caption and clearing into a gap are distinct kinds, so a sweep
/// across N windows yields N `Entered` changes however the windows are spaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCaptionChange {
    pub previous_id: Option<CaptionId>,
    /// The caption now active, `None` in gaps, pre-roll and post-roll
    pub caption: Option<MergedCaption>,
    pub time: f64,
    pub cause: ChangeCause,
}

impl ActiveCaptionChange {
    pub fn current_id(&self) -> Option<CaptionId> {
        self.caption.as_ref().map(|c| c.id)
    }

    pub fn kind(&self) -> ChangeKind {
        match self.caption {
            Some(_) => ChangeKind::Entered,
            None => ChangeKind::Cleared,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.kind() == ChangeKind::Entered
    }
}

/// Maps playback time to the active entry of a merged timeline.
#[derive(Debug, Clone)]
pub struct PlaybackSynchronizer {
    timeline: Arc<[MergedCaption]>,
    state: ActiveCaptionState,
    debounce: f64,
}

impl Default for PlaybackSynchronizer {
    fn default() -> Self {
        Self::new(Arc::from(Vec::new()))
    }
}

impl PlaybackSynchronizer {
    pub fn new(timeline: Arc<[MergedCaption]>) -> Self {
        Self {
            timeline,
            state: ActiveCaptionState::default(),
            debounce: DEFAULT_DEBOUNCE_SECS,
        }
    }

    pub fn with_debounce(mut self, debounce: f64) -> Self {
        self.debounce = debounce.max(0.0);
        self
    }

    pub fn timeline(&self) -> &Arc<[MergedCaption]> {
        &self.timeline
    }

    pub fn state(&self) -> ActiveCaptionState {
        self.state
    }

    /// The caption currently considered active.
    pub fn active(&self) -> Option<&MergedCaption> {
        let id = self.state.current_id?;
        self.timeline.iter().find(|c| c.id == id)
    }

    /// Swap in a new timeline and forget everything about the old one.
    pub fn set_timeline(&mut self, timeline: Arc<[MergedCaption]>) {
        self.timeline = timeline;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = ActiveCaptionState::default();
    }

    /// First entry whose window contains `time`.
    pub fn find_at(&self, time: f64) -> Option<&MergedCaption> {
        self.timeline.iter().find(|c| c.contains(time))
    }

    /// Process a live time sample. Returns a change only when the active
    /// caption differs from the previous one.
    pub fn sample(&mut self, time: f64) -> Option<ActiveCaptionChange> {
        if let Some(last) = self.state.last_sampled_time {
            if (time - last).abs() < self.debounce {
                trace!(time, last, "Sample within debounce window");
                return None;
            }
        }

        self.state.last_sampled_time = Some(time);
        let change = self.recompute(time, ChangeCause::Sample);
        (change.previous_id != change.current_id()).then_some(change)
    }

    /// Jump to `time`. Always reports the resulting state.
    pub fn seek(&mut self, time: f64) -> ActiveCaptionChange {
        self.state.last_sampled_time = Some(time);
        self.recompute(time, ChangeCause::Seek)
    }

    fn recompute(&mut self, time: f64, cause: ChangeCause) -> ActiveCaptionChange {
        let caption = self.find_at(time).cloned();
        let previous_id = std::mem::replace(&mut self.state.current_id, caption.as_ref().map(|c| c.id));

        ActiveCaptionChange {
            previous_id,
            caption,
            time,
            cause,
        }
    }
}
