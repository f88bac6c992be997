//! Translation backfill.
//!
//! This crate provides:
//! - The `Translator` trait and a MyMemory HTTP client
//! - A TTL translation cache keyed by normalized text
//! - The single-flight translation queue and its schedulable worker

pub mod cache;
pub mod error;
pub mod mymemory;
pub mod normalize;
pub mod queue;
pub mod translator;
pub mod worker;

pub use cache::{cache_key, Clock, TranslationCache, TranslationCacheEntry, CACHE_KEY_PREFIX, DEFAULT_CACHE_TTL};
pub use error::{TranslateError, TranslateResult};
pub use mymemory::{MyMemoryConfig, MyMemoryTranslator, DEFAULT_MYMEMORY_ENDPOINT};
pub use normalize::normalize_text;
pub use queue::{PendingTranslation, TranslationQueue};
pub use translator::{CachingTranslator, Translator};
pub use worker::{TranslationUpdate, TranslationWorker, TranslationWorkerConfig};
