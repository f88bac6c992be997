//! Deterministic collaborators for end-to-end tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use capsync_captions::{CaptionError, CaptionResult, Fetcher};
use capsync_timeline::MediaPlayer;
use capsync_translate::Translator;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Serves canned pages; unknown URLs are 404s. Counts requests per URL.
#[derive(Default)]
pub struct CannedFetcher {
    bodies: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    hits: Mutex<HashMap<String, usize>>,
}

impl CannedFetcher {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }

    pub fn delayed(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> CaptionResult<String> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| CaptionError::fetch_failed(url, Some(404), "Not Found"))
    }
}

/// Translator that takes a while and records concurrency.
#[derive(Default)]
pub struct SlowTranslator {
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Translator for SlowTranslator {
    async fn translate(&self, text: &str, _target_language: &str) -> Option<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(text.to_string());

        tokio::time::sleep(Duration::from_millis(200)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(format!("JA({})", text))
    }
}

/// Player whose clock runs on tokio time from creation, with seeking.
pub struct ClockPlayer {
    origin: Instant,
    offset: Mutex<f64>,
}

impl ClockPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            offset: Mutex::new(0.0),
        })
    }
}

#[async_trait]
impl MediaPlayer for ClockPlayer {
    async fn current_time(&self) -> Option<f64> {
        Some(*self.offset.lock().unwrap() + self.origin.elapsed().as_secs_f64())
    }

    async fn seek_to(&self, time: f64) {
        *self.offset.lock().unwrap() = time - self.origin.elapsed().as_secs_f64();
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

pub fn track_url(video_id: &str, lang: &str, asr: bool) -> String {
    let kind = if asr { "&kind=asr" } else { "" };
    format!("https://www.youtube.com/api/timedtext?v={}&lang={}{}", video_id, lang, kind)
}

/// Watch page embedding a player response with the given `(lang, asr)` tracks.
/// Track URLs are relative and `&`-escaped the way the page serves them.
pub fn watch_page(video_id: &str, tracks: &[(&str, bool)]) -> String {
    let entries: Vec<String> = tracks
        .iter()
        .map(|(lang, asr)| {
            let url = track_url(video_id, lang, *asr)
                .replace("https://www.youtube.com", "")
                .replace('&', "\\u0026");
            let kind = if *asr { r#","kind":"asr""# } else { "" };
            format!(r#"{{"baseUrl":"{}","languageCode":"{}"{}}}"#, url, lang, kind)
        })
        .collect();

    format!(
        r#"<html><script>var ytInitialPlayerResponse = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{}]}}}}}};</script></html>"#,
        entries.join(",")
    )
}

/// srv1 document from `(start, dur, text)` triples.
pub fn timed_text(nodes: &[(f64, f64, &str)]) -> String {
    let body: String = nodes
        .iter()
        .map(|(start, dur, text)| format!(r#"<text start="{}" dur="{}">{}</text>"#, start, dur, text))
        .collect();
    format!(r#"<?xml version="1.0" encoding="utf-8" ?><transcript>{}</transcript>"#, body)
}
