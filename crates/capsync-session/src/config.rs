//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use capsync_captions::RetryConfig;
use capsync_models::LanguagePair;
use capsync_timeline::{MergeThresholds, SamplerConfig, DEFAULT_DEBOUNCE_SECS};
use capsync_translate::{MyMemoryConfig, TranslationWorkerConfig, DEFAULT_CACHE_TTL};

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Spoken language and translation language
    pub languages: LanguagePair,
    /// How often playback time is sampled
    pub sample_interval: Duration,
    /// Sample movements below this many seconds are ignored
    pub debounce: f64,
    /// Seconds ahead of playback to backfill translations
    pub lookahead: f64,
    pub cache_ttl: Duration,
    /// Watch-page fetch attempts
    pub page_retries: u32,
    /// Backoff unit; attempt n waits n times this
    pub retry_base_delay: Duration,
    /// JSON file backing the cache and session state
    pub state_file: PathBuf,
    /// Contact address for the translation service
    pub translate_email: Option<String>,
    pub merge: MergeThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            languages: LanguagePair::default(),
            sample_interval: Duration::from_millis(100),
            debounce: DEFAULT_DEBOUNCE_SECS,
            lookahead: 10.0,
            cache_ttl: DEFAULT_CACHE_TTL,
            page_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            state_file: PathBuf::from("capsync-state.json"),
            translate_email: None,
            merge: MergeThresholds::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let merge_defaults = MergeThresholds::default();

        Self {
            languages: LanguagePair::new(
                std::env::var("CAPSYNC_SOURCE_LANG").unwrap_or_else(|_| defaults.languages.source.clone()),
                std::env::var("CAPSYNC_TARGET_LANG").unwrap_or_else(|_| defaults.languages.target.clone()),
            ),
            sample_interval: Duration::from_millis(env_parse("CAPSYNC_SAMPLE_INTERVAL_MS").unwrap_or(100)),
            debounce: env_parse("CAPSYNC_DEBOUNCE_SECS").unwrap_or(defaults.debounce),
            lookahead: env_parse("CAPSYNC_LOOKAHEAD_SECS").unwrap_or(defaults.lookahead),
            cache_ttl: Duration::from_secs(env_parse::<u64>("CAPSYNC_CACHE_TTL_DAYS").unwrap_or(30) * 24 * 60 * 60),
            page_retries: env_parse("CAPSYNC_PAGE_RETRIES").unwrap_or(defaults.page_retries),
            retry_base_delay: Duration::from_millis(env_parse("CAPSYNC_RETRY_BASE_MS").unwrap_or(1000)),
            state_file: std::env::var("CAPSYNC_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_file),
            translate_email: std::env::var("CAPSYNC_TRANSLATE_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            merge: MergeThresholds {
                force_merge_gap: env_parse("CAPSYNC_MERGE_FORCE_GAP_SECS").unwrap_or(merge_defaults.force_merge_gap),
                fallback_gap: env_parse("CAPSYNC_MERGE_FALLBACK_GAP_SECS").unwrap_or(merge_defaults.fallback_gap),
                max_chars: env_parse("CAPSYNC_MERGE_MAX_CHARS").unwrap_or(merge_defaults.max_chars),
                short_words: env_parse("CAPSYNC_MERGE_SHORT_WORDS").unwrap_or(merge_defaults.short_words),
                small_group_words: env_parse("CAPSYNC_MERGE_SMALL_GROUP_WORDS")
                    .unwrap_or(merge_defaults.small_group_words),
            },
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new("watch_page")
            .with_max_attempts(self.page_retries)
            .with_base_delay(self.retry_base_delay)
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            interval: self.sample_interval,
            debounce: self.debounce,
        }
    }

    pub fn worker_config(&self) -> TranslationWorkerConfig {
        TranslationWorkerConfig {
            lookahead: self.lookahead,
            target_language: self.languages.target.clone(),
            ..Default::default()
        }
    }

    pub fn mymemory_config(&self) -> MyMemoryConfig {
        MyMemoryConfig {
            source_language: self.languages.source.clone(),
            email: self.translate_email.clone(),
            ..Default::default()
        }
    }
}
