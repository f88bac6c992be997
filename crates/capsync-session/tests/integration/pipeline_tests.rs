//! Caption loading end to end.

use std::sync::Arc;
use std::time::Duration;

use capsync_captions::{CaptionPipeline, RetryConfig};
use capsync_models::{LanguagePair, TrackKind};
use capsync_session::{CaptionSession, SessionConfig};
use capsync_storage::{JsonFileStore, KeyValueStore, MemoryStore};

use super::fakes::*;

fn fast_config() -> SessionConfig {
    SessionConfig {
        retry_base_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_manual_track_preferred_over_earlier_auto() {
    let fetcher = CannedFetcher::default()
        .with(&watch_url(VIDEO_ID), &watch_page(VIDEO_ID, &[("en", true), ("en", false)]))
        .with(&track_url(VIDEO_ID, "en", false), &timed_text(&[(0.0, 1.0, "Manual line")]))
        .with(&track_url(VIDEO_ID, "en", true), &timed_text(&[(0.0, 1.0, "auto line")]));

    let pipeline = CaptionPipeline::new(Arc::new(fetcher), LanguagePair::default());
    let loaded = pipeline.load(VIDEO_ID).await;

    let source = loaded.selection.source.expect("source track");
    assert_eq!(source.kind, TrackKind::Manual);
    assert_eq!(loaded.captions[0].text, "Manual line");
    assert!(!loaded.captions[0].is_auto_generated);
}

#[tokio::test(start_paused = true)]
async fn test_bilingual_tracks_are_index_aligned() {
    let fetcher = Arc::new(
        CannedFetcher::default()
            .with(&watch_url(VIDEO_ID), &watch_page(VIDEO_ID, &[("en", false), ("ja", false)]))
            .with(
                &track_url(VIDEO_ID, "en", false),
                &timed_text(&[(0.0, 1.5, "Good morning."), (2.0, 1.5, "How are you?")]),
            )
            .with(
                &track_url(VIDEO_ID, "ja", false),
                &timed_text(&[(0.0, 1.5, "おはよう。"), (2.0, 1.5, "元気？")]),
            )
            // The target track finishes first.
            .delayed(&track_url(VIDEO_ID, "en", false), Duration::from_millis(500)),
    );

    let store = Arc::new(MemoryStore::new());
    let mut session = CaptionSession::new(
        fast_config(),
        fetcher.clone(),
        Arc::new(SlowTranslator::default()),
        ClockPlayer::new(),
        store,
    );

    let video = session.load_video(VIDEO_ID).await;
    assert_eq!(video.timeline.len(), 2);
    assert_eq!(video.timeline[0].translation.as_deref(), Some("おはよう。"));
    assert_eq!(video.timeline[1].translation.as_deref(), Some("元気？"));
    assert_eq!(fetcher.hits(&track_url(VIDEO_ID, "ja", false)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_asr_fragments_merge_into_sentences() {
    let fetcher = CannedFetcher::default()
        .with(&watch_url(VIDEO_ID), &watch_page(VIDEO_ID, &[("en", true)]))
        .with(
            &track_url(VIDEO_ID, "en", true),
            &timed_text(&[
                (0.0, 2.0, "Hello"),
                (2.5, 1.5, "and how"),
                (4.0, 2.0, "are you today."),
                (12.0, 2.0, "Let me show you something really quite interesting"),
            ]),
        );

    let mut session = CaptionSession::new(
        fast_config(),
        Arc::new(fetcher),
        Arc::new(SlowTranslator::default()),
        ClockPlayer::new(),
        Arc::new(MemoryStore::new()),
    );

    let video = session.load_video(VIDEO_ID).await;
    assert_eq!(video.timeline.len(), 2);

    let first = &video.timeline[0];
    assert_eq!(first.text, "Hello and how are you today.");
    assert_eq!((first.start_time, first.end_time), (0.0, 6.0));
    assert_eq!(first.member_ids, vec![1, 2, 3]);
    assert_eq!(video.timeline[1].member_ids, vec![4]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_manifest_retries_then_degrades() {
    let fetcher = Arc::new(CannedFetcher::default().with(&watch_url(VIDEO_ID), "<html>no captions here</html>"));

    let pipeline = CaptionPipeline::new(fetcher.clone(), LanguagePair::default())
        .with_retry(RetryConfig::new("watch_page").with_base_delay(Duration::from_millis(10)));
    let loaded = pipeline.load(VIDEO_ID).await;

    assert!(loaded.is_empty());
    assert_eq!(fetcher.hits(&watch_url(VIDEO_ID)), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unusable_source_track_yields_empty_timeline() {
    // Manifest lists the track but the track URL 404s.
    let fetcher = CannedFetcher::default().with(&watch_url(VIDEO_ID), &watch_page(VIDEO_ID, &[("en", false)]));

    let mut session = CaptionSession::new(
        fast_config(),
        Arc::new(fetcher),
        Arc::new(SlowTranslator::default()),
        ClockPlayer::new(),
        Arc::new(MemoryStore::new()),
    );

    let video = session.load_video(VIDEO_ID).await;
    assert!(video.timeline.is_empty());
    assert_eq!(video.tracks.len(), 1);
}

#[tokio::test]
async fn test_state_survives_restart_in_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let fetcher = Arc::new(
        CannedFetcher::default()
            .with(&watch_url(VIDEO_ID), &watch_page(VIDEO_ID, &[("en", false)]))
            .with(&track_url(VIDEO_ID, "en", false), &timed_text(&[(0.0, 1.0, "Hi there.")])),
    );

    {
        let mut session = CaptionSession::new(
            fast_config(),
            fetcher.clone(),
            Arc::new(SlowTranslator::default()),
            ClockPlayer::new(),
            Arc::new(JsonFileStore::new(&path)),
        );
        session.load_video(VIDEO_ID).await;
        session.backfill(0.0).await.unwrap();
    }

    let store = Arc::new(JsonFileStore::new(&path));
    assert_eq!(store.get("last_video").await.unwrap().as_deref(), Some(VIDEO_ID));

    let translator = Arc::new(SlowTranslator::default());
    let mut session = CaptionSession::new(
        fast_config(),
        fetcher,
        translator.clone(),
        ClockPlayer::new(),
        store,
    );
    assert_eq!(session.saved_tracks(VIDEO_ID).await.unwrap().len(), 1);

    // The persisted translation cache answers without a network call.
    session.load_video(VIDEO_ID).await;
    session.backfill(0.0).await.unwrap();
    assert_eq!(session.translation_for(1).await.as_deref(), Some("JA(Hi there.)"));
    assert!(translator.calls.lock().unwrap().is_empty());
}
