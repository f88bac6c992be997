//! Playback synchronization and translation backfill end to end.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use capsync_session::{CaptionSession, LoadedVideo, SessionConfig};
use capsync_storage::MemoryStore;
use capsync_timeline::{ChangeCause, ChangeKind};

use super::fakes::*;

/// Five manual captions, one per two seconds, no bundled translation.
fn five_caption_fetcher(video_id: &str) -> CannedFetcher {
    CannedFetcher::default()
        .with(&watch_url(video_id), &watch_page(video_id, &[("en", false)]))
        .with(
            &track_url(video_id, "en", false),
            &timed_text(&[
                (0.0, 2.0, "One."),
                (2.0, 2.0, "Two."),
                (4.0, 2.0, "Three."),
                (6.0, 2.0, "Four."),
                (8.0, 2.0, "Five."),
            ]),
        )
}

async fn load(fetcher: CannedFetcher, translator: Arc<SlowTranslator>) -> (CaptionSession, LoadedVideo) {
    let mut session = CaptionSession::new(
        SessionConfig::default(),
        Arc::new(fetcher),
        translator,
        ClockPlayer::new(),
        Arc::new(MemoryStore::new()),
    );
    let video = session.load_video(VIDEO_ID).await;
    (session, video)
}

#[tokio::test(start_paused = true)]
async fn test_playback_crossing_three_windows_notifies_three_times() {
    let (mut session, mut video) = load(five_caption_fetcher(VIDEO_ID), Arc::new(SlowTranslator::default())).await;

    session.play().unwrap();
    tokio::time::sleep(Duration::from_millis(5050)).await;
    session.pause().await.unwrap();

    let mut ids = Vec::new();
    while let Ok(change) = video.caption_events.try_recv() {
        assert_eq!(change.cause, ChangeCause::Sample);
        ids.push(change.current_id());
    }
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_gaps_between_windows_are_separate_clears() {
    let fetcher = CannedFetcher::default()
        .with(&watch_url(VIDEO_ID), &watch_page(VIDEO_ID, &[("en", false)]))
        .with(
            &track_url(VIDEO_ID, "en", false),
            &timed_text(&[(0.0, 1.0, "One."), (2.0, 1.0, "Two."), (4.0, 1.0, "Three.")]),
        );
    let (mut session, mut video) = load(fetcher, Arc::new(SlowTranslator::default())).await;

    session.play().unwrap();
    tokio::time::sleep(Duration::from_millis(4550)).await;
    session.pause().await.unwrap();

    let mut entered = Vec::new();
    let mut cleared = 0;
    while let Ok(change) = video.caption_events.try_recv() {
        match change.kind() {
            ChangeKind::Entered => entered.push(change.current_id()),
            ChangeKind::Cleared => cleared += 1,
        }
    }
    assert_eq!(entered, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(cleared, 2);
}

#[tokio::test(start_paused = true)]
async fn test_seek_reports_caption_immediately() {
    let (session, mut video) = load(five_caption_fetcher(VIDEO_ID), Arc::new(SlowTranslator::default())).await;

    let change = session.seek(6.5).await.unwrap();
    assert_eq!(change.current_id(), Some(4));
    assert_eq!(change.cause, ChangeCause::Seek);
    assert_eq!(session.active_caption().await.map(|c| c.id), Some(4));

    let event = video.caption_events.try_recv().unwrap();
    assert_eq!(event.current_id(), Some(4));
}

#[tokio::test(start_paused = true)]
async fn test_backfill_runs_one_translation_at_a_time() {
    let translator = Arc::new(SlowTranslator::default());
    let (mut session, mut video) = load(five_caption_fetcher(VIDEO_ID), translator.clone()).await;

    session.play().unwrap();
    let mut translated = Vec::new();
    while translated.len() < 5 {
        let update = video.translation_updates.recv().await.unwrap();
        translated.push(update.caption_id);
    }
    session.pause().await.unwrap();

    assert_eq!(translated, vec![1, 2, 3, 4, 5]);
    assert_eq!(translator.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(translator.calls.lock().unwrap().len(), 5);
    assert_eq!(session.translation_for(5).await.as_deref(), Some("JA(Five.)"));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_text_is_translated_once() {
    let fetcher = CannedFetcher::default()
        .with(&watch_url(VIDEO_ID), &watch_page(VIDEO_ID, &[("en", false)]))
        .with(
            &track_url(VIDEO_ID, "en", false),
            &timed_text(&[(0.0, 2.0, "Thank you."), (3.0, 2.0, "Thank   you.")]),
        );
    let translator = Arc::new(SlowTranslator::default());
    let (session, _video) = load(fetcher, translator.clone()).await;

    assert_eq!(session.backfill(0.0).await.unwrap(), 2);
    assert_eq!(translator.calls.lock().unwrap().len(), 1);
    assert_eq!(session.translation_for(1).await, session.translation_for(2).await);
}

#[tokio::test(start_paused = true)]
async fn test_loading_new_video_cancels_previous_backfill() {
    const OTHER: &str = "aaaaaaaaaaa";

    let fetcher = five_caption_fetcher(VIDEO_ID)
        .with(&watch_url(OTHER), &watch_page(OTHER, &[("en", false)]))
        .with(&track_url(OTHER, "en", false), &timed_text(&[(0.0, 2.0, "Other video.")]));
    let translator = Arc::new(SlowTranslator::default());

    let mut session = CaptionSession::new(
        SessionConfig::default(),
        Arc::new(fetcher),
        translator.clone(),
        ClockPlayer::new(),
        Arc::new(MemoryStore::new()),
    );

    let _first = session.load_video(VIDEO_ID).await;
    session.play().unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut second = session.load_video(OTHER).await;
    assert!(!session.is_playing());
    assert_eq!(session.video_id(), Some(OTHER));

    session.backfill(0.0).await.unwrap();
    let update = second.translation_updates.try_recv().unwrap();
    assert_eq!(update.caption_id, 1);
    assert_eq!(update.translation.as_deref(), Some("JA(Other video.)"));

    // The first video's remaining captions were never requested.
    let calls = translator.calls.lock().unwrap().clone();
    assert!(!calls.iter().any(|c| c == "Three."), "calls: {:?}", calls);
}
