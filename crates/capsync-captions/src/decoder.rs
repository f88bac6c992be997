//! Timed-text decoding.
//!
//! Two document shapes are understood:
//! - `<transcript><text start="1.2" dur="3.4">...</text></transcript>` (seconds)
//! - `<timedtext format="3"><body><p t="1200" d="3400">...</p></body></timedtext>` (milliseconds)

use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use tracing::{debug, warn};

use capsync_models::{Caption, CaptionId, CaptionTrack};

use crate::entities::decode_entities_twice;
use crate::error::{CaptionError, CaptionResult};
use crate::fetch::Fetcher;

static TEXT_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("valid regex"));

static P_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b([^>]*?)(?:/>|>(.*?)</p>)").expect("valid regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Node layout of a timed-text document.
#[derive(Debug, Clone, Copy)]
enum NodeFormat {
    /// `<text start dur>` in seconds
    Seconds,
    /// `<p t d>` in milliseconds
    Milliseconds,
}

impl NodeFormat {
    fn detect(document: &str) -> Self {
        if TEXT_NODE.is_match(document) {
            NodeFormat::Seconds
        } else {
            NodeFormat::Milliseconds
        }
    }

    fn node_pattern(self) -> &'static Regex {
        match self {
            NodeFormat::Seconds => &TEXT_NODE,
            NodeFormat::Milliseconds => &P_NODE,
        }
    }

    fn start_attr(self) -> &'static str {
        match self {
            NodeFormat::Seconds => "start",
            NodeFormat::Milliseconds => "t",
        }
    }

    fn duration_attr(self) -> &'static str {
        match self {
            NodeFormat::Seconds => "dur",
            NodeFormat::Milliseconds => "d",
        }
    }

    /// Multiplier converting attribute values to seconds.
    fn scale(self) -> f64 {
        match self {
            NodeFormat::Seconds => 1.0,
            NodeFormat::Milliseconds => 0.001,
        }
    }
}

/// Parse a timed-text document into ordered captions.
///
/// Ids are assigned 1, 2, 3, ... in document order. Nodes without a
/// positive duration are skipped, so every returned caption satisfies
/// `start_time < end_time`. Blank nodes are kept with empty text so that
/// index alignment against another track stays in step.
pub fn parse_timed_text(document: &str, is_auto_generated: bool) -> Vec<Caption> {
    let format = NodeFormat::detect(document);

    let mut captions = Vec::new();
    let mut next_id: CaptionId = 1;
    let mut skipped = 0usize;

    for node in format.node_pattern().captures_iter(document) {
        match parse_node(&node, format) {
            Some((start_time, end_time, text)) => {
                captions.push(Caption::new(next_id, start_time, end_time, text, is_auto_generated));
                next_id += 1;
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, kept = captions.len(), "Skipped zero-length timed-text nodes");
    }

    captions
}

fn parse_node(node: &Captures<'_>, format: NodeFormat) -> Option<(f64, f64, String)> {
    let attrs = node.get(1).map(|m| m.as_str()).unwrap_or_default();

    let start = attribute(attrs, format.start_attr()).and_then(parse_number)? * format.scale();
    let duration = attribute(attrs, format.duration_attr())
        .and_then(parse_number)
        .unwrap_or(0.0)
        * format.scale();
    let end = start + duration;
    if start < 0.0 || end <= start {
        return None;
    }

    let text = clean_text(node.get(2).map(|m| m.as_str()).unwrap_or_default());
    Some((start, end, text))
}

fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    ATTRIBUTE
        .captures_iter(attrs)
        .find(|caps| caps.get(1).is_some_and(|m| m.as_str() == name))
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|m| m.as_str())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strip markup, decode entities and collapse line breaks into single spaces.
fn clean_text(raw: &str) -> String {
    let without_tags = TAG.replace_all(raw, "");
    let decoded = decode_entities_twice(&without_tags);
    let without_escaped_tags = TAG.replace_all(&decoded, "");
    without_escaped_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetches and decodes caption tracks.
pub struct TimedTextDecoder {
    fetcher: Arc<dyn Fetcher>,
}

impl TimedTextDecoder {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch a track and decode it.
    ///
    /// A failed fetch is `TrackUnusable`; an empty document decodes to an
    /// empty list.
    pub async fn decode_track(&self, track: &CaptionTrack) -> CaptionResult<Vec<Caption>> {
        let document = self.fetcher.fetch(&track.source_url).await.map_err(|e| {
            warn!(
                language = %track.language_code,
                kind = %track.kind,
                error = %e,
                "Caption track fetch failed"
            );
            CaptionError::track_unusable(format!("{} ({}): {}", track.language_code, track.kind, e))
        })?;

        if document.trim().is_empty() {
            debug!(language = %track.language_code, "Caption track document is empty");
            return Ok(Vec::new());
        }

        let captions = parse_timed_text(&document, track.is_auto_generated());
        debug!(
            language = %track.language_code,
            kind = %track.kind,
            count = captions.len(),
            "Decoded caption track"
        );
        Ok(captions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use capsync_models::TrackKind;

    const SRV1_DOC: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.1">Hello &amp;amp; welcome</text>
<text start="2.6" dur="1.9">it&amp;#39;s a
multi-line
caption</text>
<text start="4.5">no duration</text>
<text start="5.0" dur="1.0"></text>
<text start="6.0" dur="1.5">&lt;font color=&quot;#E5E5E5&quot;&gt;styled&lt;/font&gt; text</text>
</transcript>"#;

    const SRV3_DOC: &str = r#"<?xml version="1.0" encoding="utf-8" ?><timedtext format="3">
<body>
<p t="1200" d="2300" w="1"><s ac="0">so</s><s t="400" ac="0"> today</s><s t="800" ac="0"> we</s></p>
<p t="3500" d="10" w="1" a="1">
</p>
<p t="3510" d="2000" w="1"><s ac="0">talk</s></p>
</body>
</timedtext>"#;

    #[test]
    fn test_parse_srv1() {
        let captions = parse_timed_text(SRV1_DOC, true);
        assert_eq!(captions.len(), 4);

        assert_eq!(captions[0].id, 1);
        assert_eq!(captions[0].start_time, 0.5);
        assert!((captions[0].end_time - 2.6).abs() < 1e-9);
        assert_eq!(captions[0].text, "Hello & welcome");
        assert!(captions[0].is_auto_generated);

        assert_eq!(captions[1].id, 2);
        assert_eq!(captions[1].text, "it's a multi-line caption");

        assert_eq!(captions[2].id, 3);
        assert_eq!(captions[2].text, "");
        assert_eq!(captions[2].start_time, 5.0);

        assert_eq!(captions[3].id, 4);
        assert_eq!(captions[3].text, "styled text");
    }

    #[test]
    fn test_parse_srv3_milliseconds() {
        let captions = parse_timed_text(SRV3_DOC, true);
        assert_eq!(captions.len(), 3);
        assert!((captions[0].start_time - 1.2).abs() < 1e-9);
        assert!((captions[0].end_time - 3.5).abs() < 1e-9);
        assert_eq!(captions[0].text, "so today we");
        assert_eq!(captions[1].id, 2);
        assert_eq!(captions[1].text, "");
        assert_eq!(captions[2].id, 3);
        assert_eq!(captions[2].text, "talk");
    }

    #[test]
    fn test_blank_target_node_keeps_alignment() {
        let source = parse_timed_text(
            r#"<transcript><text start="0" dur="1">A</text><text start="1" dur="1">B</text><text start="2" dur="1">C</text></transcript>"#,
            false,
        );
        let target = parse_timed_text(
            r#"<transcript><text start="0" dur="1">ア</text><text start="1" dur="1"></text><text start="2" dur="1">シ</text></transcript>"#,
            false,
        );
        assert_eq!(target.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let aligned = crate::aligner::align_by_index(source, &target);
        let pairs: Vec<_> = aligned
            .iter()
            .map(|c| (c.text.as_str(), c.translation.as_deref()))
            .collect();
        assert_eq!(pairs, vec![("A", Some("ア")), ("B", None), ("C", Some("シ"))]);
    }

    #[test]
    fn test_decoded_invariants() {
        let captions = parse_timed_text(SRV1_DOC, false);
        for pair in captions.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
        for caption in &captions {
            assert!(caption.start_time < caption.end_time);
            assert!(!caption.is_auto_generated);
        }
    }

    #[test]
    fn test_empty_and_garbage_documents() {
        assert!(parse_timed_text("", true).is_empty());
        assert!(parse_timed_text("<html>not captions</html>", true).is_empty());
        assert!(parse_timed_text(r#"<transcript><text start="abc" dur="1">x</text></transcript>"#, true).is_empty());
    }

    #[test]
    fn test_single_quoted_attributes() {
        let captions = parse_timed_text("<transcript><text start='1' dur='2'>hi</text></transcript>", true);
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].end_time, 3.0);
    }

    struct StaticFetcher(CaptionResult<&'static str>);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> CaptionResult<String> {
            match &self.0 {
                Ok(body) => Ok(body.to_string()),
                Err(_) => Err(CaptionError::fetch_failed(url, Some(404), "Not Found")),
            }
        }
    }

    #[tokio::test]
    async fn test_decode_track_fetch_failure_is_unusable() {
        let decoder = TimedTextDecoder::new(Arc::new(StaticFetcher(Err(CaptionError::track_unusable("x")))));
        let track = CaptionTrack::new("en", TrackKind::Manual, "https://example.com/t");
        let err = decoder.decode_track(&track).await.unwrap_err();
        assert!(matches!(err, CaptionError::TrackUnusable(_)));
    }

    #[tokio::test]
    async fn test_decode_track_uses_track_kind() {
        let decoder = TimedTextDecoder::new(Arc::new(StaticFetcher(Ok(SRV1_DOC))));
        let track = CaptionTrack::new("en", TrackKind::AutoGenerated, "https://example.com/t");
        let captions = decoder.decode_track(&track).await.unwrap();
        assert_eq!(captions.len(), 4);
        assert!(captions.iter().all(|c| c.is_auto_generated));
    }

    #[tokio::test]
    async fn test_decode_track_empty_document() {
        let decoder = TimedTextDecoder::new(Arc::new(StaticFetcher(Ok("  "))));
        let track = CaptionTrack::new("ja", TrackKind::Manual, "https://example.com/t");
        assert!(decoder.decode_track(&track).await.unwrap().is_empty());
    }
}
