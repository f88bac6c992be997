//! Translation cache over a key-value store.
//!
//! Keys are `translation_cache_` followed by the SHA-256 hex digest of the
//! target language and the normalized source text. Entries older than the TTL
//! are ignored and get superseded by the next successful lookup.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use capsync_storage::KeyValueStore;

use crate::error::TranslateResult;

pub const CACHE_KEY_PREFIX: &str = "translation_cache_";

/// 30 days.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Injectable wall clock.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Store key for a normalized text in one target language.
pub fn cache_key(target_language: &str, normalized_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target_language.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalized_text.as_bytes());
    format!("{}{:x}", CACHE_KEY_PREFIX, hasher.finalize())
}

/// A cached translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationCacheEntry {
    pub normalized_text: String,
    /// Older entries predate per-language keys
    #[serde(default)]
    pub target_language: String,
    pub translation: String,
    pub timestamp: DateTime<Utc>,
}

impl TranslationCacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.timestamp).to_std() {
            Ok(age) => age < ttl,
            // Written "in the future" (clock skew): still usable.
            Err(_) => true,
        }
    }
}

pub struct TranslationCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    clock: Clock,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_CACHE_TTL,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached translation for a normalized text.
    ///
    /// Unreadable entries count as misses.
    pub async fn get(&self, target_language: &str, normalized_text: &str) -> TranslateResult<Option<String>> {
        let key = cache_key(target_language, normalized_text);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let entry: TranslationCacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable translation cache entry");
                return Ok(None);
            }
        };

        if entry.normalized_text != normalized_text || entry.target_language != target_language {
            return Ok(None);
        }

        if !entry.is_fresh((self.clock)(), self.ttl) {
            debug!(key = %key, cached_at = %entry.timestamp, "Translation cache entry expired");
            return Ok(None);
        }

        Ok(Some(entry.translation))
    }

    /// Store a translation stamped with the current time.
    pub async fn put(&self, target_language: &str, normalized_text: &str, translation: &str) -> TranslateResult<()> {
        let entry = TranslationCacheEntry {
            normalized_text: normalized_text.to_string(),
            target_language: target_language.to_string(),
            translation: translation.to_string(),
            timestamp: (self.clock)(),
        };

        self.store
            .set(&cache_key(target_language, normalized_text), serde_json::to_string(&entry)?)
            .await?;
        Ok(())
    }
}
