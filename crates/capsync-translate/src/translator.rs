//! Translator abstraction and the caching decorator.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, warn};

use crate::cache::TranslationCache;
use crate::normalize::normalize_text;

/// Translates caption text into a target language.
///
/// Failures are reported as `None`; nothing here is fatal to playback.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Option<String>;
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for Arc<T> {
    async fn translate(&self, text: &str, target_language: &str) -> Option<String> {
        (**self).translate(text, target_language).await
    }
}

/// Normalizes text and consults the cache before the inner translator.
pub struct CachingTranslator<T> {
    inner: T,
    cache: TranslationCache,
}

impl<T: Translator> CachingTranslator<T> {
    pub fn new(inner: T, cache: TranslationCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Translator> Translator for CachingTranslator<T> {
    async fn translate(&self, text: &str, target_language: &str) -> Option<String> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return None;
        }

        match self.cache.get(target_language, &normalized).await {
            Ok(Some(hit)) => {
                counter!("capsync_translation_cache_hits_total").increment(1);
                debug!(chars = normalized.chars().count(), "Translation cache hit");
                return Some(hit);
            }
            Ok(None) => {
                counter!("capsync_translation_cache_misses_total").increment(1);
            }
            Err(e) => {
                counter!("capsync_translation_cache_misses_total").increment(1);
                warn!(error = %e, "Translation cache read failed");
            }
        }

        let translation = self.inner.translate(&normalized, target_language).await?;

        if let Err(e) = self.cache.put(target_language, &normalized, &translation).await {
            warn!(error = %e, "Translation cache write failed");
        }
        Some(translation)
    }
}
