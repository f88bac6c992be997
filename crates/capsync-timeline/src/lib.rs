//! Caption timelines.
//!
//! This crate provides:
//! - Sentence-level merging of auto-generated caption fragments
//! - The active-caption synchronizer driven by playback time
//! - A schedulable sampler that polls a media player

pub mod merger;
pub mod sampler;
pub mod synchronizer;

pub use merger::{merge_captions, MergeThresholds, SentenceMerger};
pub use sampler::{MediaPlayer, PlaybackSampler, SamplerConfig};
pub use synchronizer::{
    ActiveCaptionChange, ActiveCaptionState, ChangeCause, ChangeKind, PlaybackSynchronizer, DEFAULT_DEBOUNCE_SECS,
};
