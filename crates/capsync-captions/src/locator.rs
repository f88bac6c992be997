//! Caption manifest location in watch-page markup.
//!
//! `locate_caption_tracks` takes raw page text and returns the caption track
//! descriptors embedded in it. It performs no I/O so it can be tested against
//! static fixtures.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use capsync_models::{CaptionTrack, TrackKind};

use crate::entities::decode_entities;
use crate::error::{CaptionError, CaptionResult};

/// Origin that relative track URLs are resolved against.
pub const DEFAULT_ORIGIN: &str = "https://www.youtube.com";

/// Start of the caption track array inside the player response.
static CAPTION_TRACKS_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""captionTracks"\s*:\s*\["#).expect("valid regex"));

/// Track entries inside a `"captions":{...}` block whose JSON is not parseable
/// on its own (e.g. truncated or embedded in a script string).
static TRACK_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\{\\?"baseUrl\\?":\\?"((?:[^"\\]|\\.)*?)\\?"(?:[^{}]|\{[^{}]*\}|\{[^{}]*\{[^{}]*\}[^{}]*\})*?\\?"languageCode\\?":\\?"([A-Za-z0-9_-]+)\\?""#,
    )
    .expect("valid regex")
});

static CAPTIONS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\\?"captions\\?":\s*(\{.*?playerCaptionsTracklistRenderer.*?\}\}\})"#)
        .expect("valid regex")
});

/// One caption track as advertised by the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// Decoded base URL, possibly relative
    pub base_url: String,
    pub language_code: String,
    /// `kind` field of the manifest entry (`asr` for speech recognition)
    pub kind: Option<String>,
    /// `vssId` field (`a.en` for speech recognition, `.en` for manual)
    pub vss_id: Option<String>,
    /// Display name of the track
    pub name: Option<String>,
}

impl TrackDescriptor {
    /// Whether the descriptor points at an auto-generated track.
    pub fn is_auto_generated(&self) -> bool {
        url_has_asr_marker(&self.base_url)
            || self.kind.as_deref() == Some("asr")
            || self.vss_id.as_deref().is_some_and(|v| v.starts_with("a."))
    }

    /// Convert to a `CaptionTrack` with an absolute URL.
    pub fn to_track(&self, origin: &str) -> CaptionResult<CaptionTrack> {
        let kind = if self.is_auto_generated() {
            TrackKind::AutoGenerated
        } else {
            TrackKind::Manual
        };
        let source_url = absolute_url(&self.base_url, origin)?;
        Ok(CaptionTrack::new(self.language_code.clone(), kind, source_url))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    vss_id: Option<String>,
    #[serde(default)]
    name: Option<RawTrackName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrackName {
    #[serde(default)]
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<RawRun>,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    text: String,
}

impl From<RawCaptionTrack> for TrackDescriptor {
    fn from(raw: RawCaptionTrack) -> Self {
        let name = raw.name.and_then(|n| {
            n.simple_text.or_else(|| {
                let joined: String = n.runs.into_iter().map(|r| r.text).collect();
                (!joined.is_empty()).then_some(joined)
            })
        });

        Self {
            base_url: normalize_base_url(&raw.base_url),
            language_code: raw.language_code,
            kind: raw.kind,
            vss_id: raw.vss_id,
            name,
        }
    }
}

/// Locate caption track descriptors in watch-page markup.
///
/// Fails with `ManifestNotFound` when the page carries no track list.
pub fn locate_caption_tracks(page: &str) -> CaptionResult<Vec<TrackDescriptor>> {
    if let Some(tracks) = parse_track_array(page) {
        debug!(count = tracks.len(), "Located caption tracks in player response");
        return Ok(tracks);
    }

    if let Some(tracks) = scan_captions_block(page) {
        debug!(count = tracks.len(), "Located caption tracks by pattern scan");
        return Ok(tracks);
    }

    Err(CaptionError::manifest_not_found(
        "page contains no caption track list",
    ))
}

/// Parse the first `"captionTracks":[...]` array as JSON.
fn parse_track_array(page: &str) -> Option<Vec<TrackDescriptor>> {
    for m in CAPTION_TRACKS_START.find_iter(page) {
        // Start at the '[' so the stream deserializer reads exactly one array
        let array_start = m.end() - 1;
        let mut stream = serde_json::Deserializer::from_str(&page[array_start..])
            .into_iter::<Vec<RawCaptionTrack>>();

        match stream.next() {
            Some(Ok(raw)) if !raw.is_empty() => {
                return Some(raw.into_iter().map(TrackDescriptor::from).collect());
            }
            Some(Err(e)) => {
                debug!(error = %e, "captionTracks array is not valid JSON");
            }
            _ => {}
        }
    }
    None
}

/// Fall back to matching individual track entries inside the captions block.
fn scan_captions_block(page: &str) -> Option<Vec<TrackDescriptor>> {
    let block = CAPTIONS_BLOCK.captures(page)?.get(1)?.as_str();

    let tracks: Vec<TrackDescriptor> = TRACK_ENTRY
        .captures_iter(block)
        .filter_map(|caps| {
            let base_url = normalize_base_url(&unescape_json_string(caps.get(1)?.as_str()));
            let language_code = caps.get(2)?.as_str().to_string();
            Some(TrackDescriptor {
                base_url,
                language_code,
                kind: None,
                vss_id: None,
                name: None,
            })
        })
        .collect();

    (!tracks.is_empty()).then_some(tracks)
}

/// Undo JSON string escapes (`\u0026`, `\/`, `\"`) in raw page text.
///
/// Markup embedded in a script string is escaped twice, so decode up to two
/// levels.
fn unescape_json_string(raw: &str) -> String {
    let mut current = raw.to_string();
    for _ in 0..2 {
        if !current.contains('\\') {
            break;
        }
        match serde_json::from_str::<String>(&format!("\"{}\"", current)) {
            Ok(decoded) => current = decoded,
            Err(_) => {
                current = current
                    .replace("\\u0026", "&")
                    .replace("\\/", "/")
                    .replace("\\\"", "\"");
                break;
            }
        }
    }
    current
}

/// Decode HTML escapes left in a track URL.
fn normalize_base_url(url: &str) -> String {
    decode_entities(url.trim()).into_owned()
}

fn url_has_asr_marker(url: &str) -> bool {
    url.contains("kind=asr")
}

/// Resolve a possibly relative track URL against `origin`.
fn absolute_url(base_url: &str, origin: &str) -> CaptionResult<String> {
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        return Ok(Url::parse(base_url)?.to_string());
    }
    if let Some(rest) = base_url.strip_prefix("//") {
        return Ok(Url::parse(&format!("https://{}", rest))?.to_string());
    }
    Ok(Url::parse(origin)?.join(base_url)?.to_string())
}
