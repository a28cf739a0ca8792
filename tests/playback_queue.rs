//! Per-guild playback queue behaviour against fake audio and voice collaborators.

mod common;

use std::sync::Arc;

use common::{allowed_hosts, track_url, FakeSource, FakeVoice, RecordingNotices, VoiceCall};
use punktune::music::{
    EnqueueOutcome, PlaybackError, PlaybackManager, TrackEvent, TrackEventKind,
};
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    manager: Arc<PlaybackManager>,
    events: UnboundedReceiver<TrackEvent>,
    source: Arc<FakeSource>,
    voice: FakeVoice,
    notices: Arc<RecordingNotices>,
}

fn setup_harness(source: FakeSource) -> Harness {
    let source = Arc::new(source);
    let voice = FakeVoice::default();
    let notices = Arc::new(RecordingNotices::default());
    let (manager, events) = PlaybackManager::new(
        source.clone(),
        Arc::new(voice.clone()),
        notices.clone(),
        allowed_hosts(),
    );
    Harness {
        manager,
        events,
        source,
        voice,
        notices,
    }
}

async fn play(h: &Harness, id: &str) -> Result<EnqueueOutcome, PlaybackError> {
    h.manager
        .enqueue("g1", Some("lounge"), &track_url(id), "kuro")
        .await
}

fn event(token: u64, kind: TrackEventKind) -> TrackEvent {
    TrackEvent {
        guild: "g1".to_string(),
        token,
        kind,
    }
}

#[tokio::test]
async fn test_first_enqueue_joins_and_plays() {
    let h = setup_harness(FakeSource::default());
    let outcome = play(&h, "aaa").await.unwrap();
    assert!(matches!(outcome, EnqueueOutcome::NowPlaying(ref m) if m.title == "Song aaa"));

    let outcome = play(&h, "bbb").await.unwrap();
    assert!(matches!(outcome, EnqueueOutcome::Queued { position: 1, .. }));

    assert_eq!(
        h.voice.count(&VoiceCall::Join {
            guild: "g1".into(),
            channel: "lounge".into()
        }),
        1
    );
    assert_eq!(h.source.opened(), vec!["aaa"]);
    assert_eq!(h.manager.queue_snapshot("g1").await.len(), 2);
}

#[tokio::test]
async fn test_stream_error_advances_to_next_track() {
    let h = setup_harness(FakeSource::default());
    play(&h, "first").await.unwrap();
    play(&h, "second").await.unwrap();
    let first_token = h.voice.last_token().unwrap();

    h.manager
        .handle_event(event(first_token, TrackEventKind::Errored("decoder died".into())))
        .await;

    assert_eq!(h.source.opened(), vec!["first", "second"]);
    let queue = h.manager.queue_snapshot("g1").await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].meta.title, "Song second");
    assert_ne!(h.voice.last_token(), Some(first_token));

    let notices = h.notices.messages();
    assert!(notices.iter().any(|(_, m)| m.contains("Song first") && m.contains("decoder died")));
    assert!(notices.iter().any(|(_, m)| m.starts_with("Now playing: Song second")));
}

#[tokio::test]
async fn test_unopenable_stream_is_dropped_and_next_plays() {
    let h = setup_harness(FakeSource::with_broken_streams(&["bad"]));
    play(&h, "good").await.unwrap();
    play(&h, "bad").await.unwrap();
    play(&h, "fine").await.unwrap();

    let token = h.voice.last_token().unwrap();
    h.manager.handle_event(event(token, TrackEventKind::Finished)).await;

    assert_eq!(h.source.opened(), vec!["good", "bad", "fine"]);
    let queue = h.manager.queue_snapshot("g1").await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].meta.title, "Song fine");
    assert!(h
        .notices
        .messages()
        .iter()
        .any(|(_, m)| m.starts_with("Couldn't play Song bad")));
}

#[tokio::test]
async fn test_all_failing_tracks_drain_and_tear_down() {
    let h = setup_harness(FakeSource::with_broken_streams(&["x", "y"]));
    play(&h, "ok").await.unwrap();
    play(&h, "x").await.unwrap();
    play(&h, "y").await.unwrap();

    let token = h.voice.last_token().unwrap();
    h.manager.handle_event(event(token, TrackEventKind::Finished)).await;

    assert!(!h.manager.has_queue("g1").await);
    assert_eq!(h.voice.count(&VoiceCall::Leave), 1);
    assert_eq!(h.source.opened(), vec!["ok", "x", "y"]);
}

#[tokio::test]
async fn test_lone_failing_track_reports_failure() {
    let h = setup_harness(FakeSource::with_broken_streams(&["bad"]));
    let outcome = play(&h, "bad").await.unwrap();
    assert!(matches!(outcome, EnqueueOutcome::Failed(_)));
    assert!(!h.manager.has_queue("g1").await);
    assert_eq!(h.voice.count(&VoiceCall::Leave), 1);
    assert_eq!(h.notices.messages().len(), 1);
}

#[tokio::test]
async fn test_skip_advances_through_finished_event() {
    let mut h = setup_harness(FakeSource::default());
    play(&h, "one").await.unwrap();
    play(&h, "two").await.unwrap();

    let skipped = h.manager.skip("g1").await.unwrap();
    assert_eq!(skipped.title, "Song one");
    // Skip alone does not pop; the queue still holds both tracks.
    assert_eq!(h.manager.queue_snapshot("g1").await.len(), 2);

    let finished = h.events.recv().await.unwrap();
    assert_eq!(finished.kind, TrackEventKind::Finished);
    h.manager.handle_event(finished).await;

    let queue = h.manager.queue_snapshot("g1").await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].meta.title, "Song two");
}

#[tokio::test]
async fn test_stop_clears_and_ignores_stale_events() {
    let h = setup_harness(FakeSource::default());
    play(&h, "one").await.unwrap();
    play(&h, "two").await.unwrap();
    let old_token = h.voice.last_token().unwrap();

    assert_eq!(h.manager.stop("g1").await.unwrap(), 2);
    assert!(!h.manager.has_queue("g1").await);
    assert_eq!(h.voice.count(&VoiceCall::Leave), 1);

    // A late event from the released session must not touch a new queue.
    play(&h, "three").await.unwrap();
    h.manager.handle_event(event(old_token, TrackEventKind::Finished)).await;
    let queue = h.manager.queue_snapshot("g1").await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].meta.title, "Song three");

    assert!(matches!(h.manager.stop("g2").await, Err(PlaybackError::NothingPlaying)));
    assert!(matches!(h.manager.skip("g2").await, Err(PlaybackError::NothingPlaying)));
}

#[tokio::test]
async fn test_rejections_happen_before_joining() {
    let h = setup_harness(FakeSource::with_broken_metadata(&["gone"]));

    let err = h
        .manager
        .enqueue("g1", Some("lounge"), "https://evil.example/watch?v=1", "kuro")
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidUrl(_)));
    assert_eq!(h.source.metadata_calls(), 0);

    let err = h
        .manager
        .enqueue("g1", None, &track_url("abc"), "kuro")
        .await
        .unwrap_err();
    assert!(matches!(err, PlaybackError::NoVoiceChannel));

    let err = play(&h, "gone").await.unwrap_err();
    assert!(matches!(err, PlaybackError::Source(_)));

    assert!(h.voice.calls().is_empty());
    assert!(!h.manager.has_queue("g1").await);
}

#[tokio::test]
async fn test_guilds_are_independent() {
    let h = setup_harness(FakeSource::default());
    play(&h, "one").await.unwrap();
    h.manager
        .enqueue("g2", Some("stage"), &track_url("two"), "mika")
        .await
        .unwrap();

    h.manager.stop("g1").await.unwrap();
    assert!(!h.manager.has_queue("g1").await);
    assert!(h.manager.has_queue("g2").await);
}
