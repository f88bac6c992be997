//! Caption acquisition.
//!
//! This crate provides:
//! - Page and track fetching behind the `Fetcher` trait
//! - Manifest location in watch-page markup and per-language track selection
//! - Timed-text decoding into ordered captions
//! - Index-based bilingual alignment
//! - The end-to-end caption pipeline with non-fatal degradation

pub mod aligner;
pub mod decoder;
pub mod entities;
pub mod error;
pub mod fetch;
pub mod locator;
pub mod pipeline;
pub mod resolver;
pub mod retry;

pub use aligner::align_by_index;
pub use decoder::{parse_timed_text, TimedTextDecoder};
pub use error::{CaptionError, CaptionResult};
pub use fetch::{Fetcher, HttpFetcher, HttpFetcherConfig};
pub use locator::{locate_caption_tracks, TrackDescriptor};
pub use pipeline::{CaptionPipeline, LoadedCaptions};
pub use resolver::{select_tracks, CaptionSourceResolver, TrackSelection};
pub use retry::{retry_async, RetryConfig, RetryResult};
