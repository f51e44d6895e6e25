//! Integration tests for Playbridge Core

use playbridge_core::{
    resolve, ControllerOptions, EngineCallback, EngineErrorKind, Event, HeadlessSurfaceProvider,
    KeyAction, Lifecycle, MediaSource, Phase, RecordingChannel, SessionConfig, SessionController,
    SimulatedEngineFactory, StreamKind, SubtitleFormat, SubtitlePolicy, SurfaceSignal,
    TouchAction, TrackOrigin,
};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    controller: SessionController,
    engines: SimulatedEngineFactory,
    surfaces: HeadlessSurfaceProvider,
    channel: RecordingChannel,
}

fn harness(duration_ms: Option<u64>) -> Harness {
    let engines = SimulatedEngineFactory::new(duration_ms);
    let surfaces = HeadlessSurfaceProvider::new();
    let channel = RecordingChannel::new();
    let controller = SessionController::new(
        Box::new(engines.clone()),
        Box::new(surfaces.clone()),
        Arc::new(channel.clone()),
    );
    Harness {
        controller,
        engines,
        surfaces,
        channel,
    }
}

// =============================================================================
// Resolver Tests
// =============================================================================

#[test]
fn test_resolver_kinds() {
    let config = SessionConfig::new("unused");
    let cases = [
        ("https://cdn.example.com/live/stream.mpd", StreamKind::Dash),
        ("https://cdn.example.com/live/master.m3u8", StreamKind::Hls),
        ("https://cdn.example.com/vod/movie.ism/Manifest", StreamKind::SmoothStreaming),
        ("https://cdn.example.com/vod/movie.mp4", StreamKind::Progressive),
        ("https://cdn.example.com/vod/manifests/movie.ism", StreamKind::SmoothStreaming),
    ];

    for (uri, expected) in cases {
        assert_eq!(resolve(uri, &config).unwrap().kind, expected, "{}", uri);
    }
}

#[test]
fn test_subtitle_inference() {
    let vtt = SessionConfig::new("http://x/a.mp4").with_subtitle("http://x/a.vtt");
    let srt = SessionConfig::new("http://x/a.mp4").with_subtitle("http://x/a.srt");
    let bare = SessionConfig::new("http://x/a.mp4").with_subtitle("http://x/subtitles");

    let format = |c: &SessionConfig| resolve(&c.uri, c).unwrap().subtitle.unwrap().format;
    assert_eq!(format(&vtt), SubtitleFormat::WebVtt);
    assert_eq!(format(&srt), SubtitleFormat::SubRip);
    assert_eq!(format(&bare), SubtitleFormat::SubRip);
}

// =============================================================================
// Seek Tests
// =============================================================================

#[test]
fn test_seek_clamps_but_reports_requested_target() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));
    h.channel.clear();

    h.controller.seek_to(-500);
    h.controller.seek_to(4_000);
    h.controller.seek_to(99_000);

    let probe = h.engines.latest().unwrap();
    assert_eq!(probe.seeks(), vec![0, 4_000, 10_000]);

    let requested: Vec<i64> = h
        .channel
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Seek { requested_ms } => Some(requested_ms),
            _ => None,
        })
        .collect();
    assert_eq!(requested, vec![-500, 4_000, 99_000]);
}

#[test]
fn test_seek_with_zero_duration_goes_to_start() {
    let mut h = harness(Some(0));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));

    h.controller.seek_to(7_000);
    assert_eq!(h.engines.latest().unwrap().seeks(), vec![0]);
}

#[test]
fn test_play_offset_applied_before_prepare() {
    let mut h = harness(Some(60_000));
    let config = SessionConfig::new("http://x/video.mp4")
        .audio_only(true)
        .with_play_offset(Duration::from_millis(12_000));
    h.controller.create_session(config);

    let probe = h.engines.latest().unwrap();
    assert_eq!(probe.seeks(), vec![12_000]);
    assert!(probe.play_when_ready());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_audio_only_session() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));

    assert_eq!(h.surfaces.acquired(), 0);
    assert_eq!(h.channel.count("start"), 1);

    h.engines.latest().unwrap().signal_ready();
    h.controller.drain_signals();

    let state = h.controller.get_state();
    assert_eq!(state.phase, Phase::Ready);
    assert!(state.play_when_ready);
    assert_eq!(state.duration_ms, Some(10_000));
}

#[test]
fn test_video_session_presents_surface() {
    let mut h = harness(Some(10_000));
    let options = ControllerOptions {
        stream_title: Some("Match Highlights".to_string()),
        ..Default::default()
    };
    h.controller
        .create_session(SessionConfig::new("https://x/master.m3u8").with_controller(options.clone()));

    assert_eq!(h.surfaces.acquired(), 1);
    let log = h.surfaces.log();
    assert_eq!(log.presented, 1);
    assert_eq!(log.attached.len(), 1);
    assert_eq!(log.controller_options, vec![options]);
    assert_eq!(h.channel.count("start"), 1);
}

#[test]
fn test_resolver_failure_leaves_session_degraded() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("gopher://x/bad").audio_only(true));

    assert_eq!(h.channel.count("error"), 1);
    assert_eq!(h.channel.count("start"), 0);
    assert_eq!(h.controller.lifecycle(), Lifecycle::Presenting);
    assert!(!h.controller.has_engine());
    assert_eq!(h.engines.created(), 0);

    h.controller.play();
    h.controller.pause();
    h.controller.seek_to(100);
    assert_eq!(h.channel.records().len(), 1);

    let record = &h.channel.records()[0];
    assert!(record.is_error());
    assert!(record.state.is_none());
}

#[test]
fn test_construction_failure_reported() {
    let mut h = harness(Some(10_000));
    h.engines.refuse_creation("no decoder for this device");
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));

    match &h.channel.events()[..] {
        [Event::Error { code, message }] => {
            assert_eq!(code.as_deref(), Some("CONSTRUCTION"));
            assert!(message.contains("no decoder"));
        }
        other => panic!("unexpected events {:?}", other),
    }
    assert_eq!(h.controller.lifecycle(), Lifecycle::Presenting);
}

#[test]
fn test_close_is_idempotent() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4"));

    h.controller.close();
    h.controller.close();
    h.controller.close();

    assert_eq!(h.channel.count("stop"), 1);
    assert_eq!(h.channel.count("error"), 0);
    assert_eq!(h.surfaces.log().dismissed, 1);
    assert_eq!(h.engines.latest().unwrap().release_count(), 1);
}

#[test]
fn test_commands_after_close_are_noops() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));
    let probe = h.engines.latest().unwrap();
    h.controller.close();
    h.channel.clear();

    h.controller.play();
    h.controller.pause();
    h.controller.seek_to(5_000);
    h.controller.set_stream(Some("http://x/other.mp4"), None);

    assert!(h.channel.records().is_empty());
    assert!(probe.seeks().is_empty());
    assert_eq!(probe.prepared().len(), 1);
    assert_eq!(h.controller.get_state().phase, Phase::Idle);
}

#[test]
fn test_no_events_after_close() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));
    let probe = h.engines.latest().unwrap();
    h.controller.close();
    h.channel.clear();

    // Callbacks still queued, or raised late by the engine, must not leak out
    probe.signal_ready();
    probe.fail(EngineErrorKind::Source, TrackOrigin::Primary, "late failure");
    h.controller.drain_signals();

    assert!(h.channel.records().is_empty());
}

#[test]
fn test_dismissal_releases_session() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4"));
    h.surfaces.raise(SurfaceSignal::Dismissed);
    h.controller.drain_signals();

    assert_eq!(h.controller.lifecycle(), Lifecycle::Released);
    assert!(h.engines.latest().unwrap().is_released());
    assert_eq!(h.channel.count("stop"), 1);

    // Dismissal already tore the surface down
    h.controller.close();
    assert_eq!(h.surfaces.log().dismissed, 0);
    assert_eq!(h.channel.count("stop"), 1);
}

#[test]
fn test_set_stream_reuses_engine_and_surface() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4"));

    let options = ControllerOptions {
        hide_progress: true,
        ..Default::default()
    };
    h.controller
        .set_stream(Some("https://x/next/master.m3u8"), Some(options.clone()));

    assert_eq!(h.engines.created(), 1);
    assert_eq!(h.surfaces.acquired(), 1);

    let prepared = h.engines.latest().unwrap().prepared();
    assert_eq!(prepared.len(), 2);
    assert!(matches!(
        prepared[1],
        MediaSource::Stream { kind: StreamKind::Hls, .. }
    ));
    assert_eq!(h.surfaces.log().controller_options.last(), Some(&options));
}

#[test]
fn test_set_stream_infers_kind_from_new_uri() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(
        SessionConfig::new("https://x/stream?id=1")
            .with_mime_type("application/dash+xml")
            .audio_only(true),
    );
    h.controller.set_stream(Some("https://x/next/master.m3u8"), None);
    // Same URI again: the configured hint applies
    h.controller.set_stream(Some("https://x/stream?id=1"), None);

    let kinds: Vec<StreamKind> = h
        .engines
        .latest()
        .unwrap()
        .prepared()
        .iter()
        .filter_map(|source| match source {
            MediaSource::Stream { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![StreamKind::Dash, StreamKind::Hls, StreamKind::Dash]);
}

#[test]
fn test_set_stream_recovers_degraded_session() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("not a uri").audio_only(true));
    assert!(!h.controller.has_engine());

    h.controller.set_stream(Some("http://x/video.mp4"), None);
    assert!(h.controller.has_engine());
    assert_eq!(h.engines.created(), 1);
}

// =============================================================================
// Event Translation Tests
// =============================================================================

#[test]
fn test_engine_events_forwarded() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));
    h.controller.drain_signals();
    h.channel.clear();

    let probe = h.engines.latest().unwrap();
    probe.emit(EngineCallback::PlaybackParametersChanged { speed: 2.0, pitch: 1.0 });
    probe.emit(EngineCallback::TracksChanged { track_count: 2 });
    probe.signal_ended();
    probe.fail(EngineErrorKind::Renderer, TrackOrigin::Primary, "decoder crashed");
    h.controller.drain_signals();

    assert_eq!(
        h.channel.events(),
        vec![
            Event::StateChanged { phase: Phase::Ended },
            Event::Error {
                code: Some("RENDERER".to_string()),
                message: "decoder crashed".to_string()
            },
        ]
    );
    // Runtime errors do not end the session
    assert_eq!(h.controller.lifecycle(), Lifecycle::Presenting);
}

#[test]
fn test_subtitle_failure_policies() {
    let mut degrade = harness(Some(10_000));
    degrade.controller.create_session(
        SessionConfig::new("http://x/video.mp4")
            .audio_only(true)
            .with_subtitle("http://x/subs.srt"),
    );
    degrade.controller.drain_signals();
    let probe = degrade.engines.latest().unwrap();
    probe.fail(EngineErrorKind::Source, TrackOrigin::Subtitle, "subs.srt: 404");
    degrade.controller.drain_signals();
    assert_eq!(degrade.channel.count("error"), 0);
    assert!(probe.play_when_ready());

    let mut fatal = harness(Some(10_000));
    fatal.controller.create_session(
        SessionConfig::new("http://x/video.mp4")
            .audio_only(true)
            .with_subtitle("http://x/subs.srt")
            .with_subtitle_policy(SubtitlePolicy::Fatal),
    );
    fatal.controller.drain_signals();
    let probe = fatal.engines.latest().unwrap();
    probe.fail(EngineErrorKind::Source, TrackOrigin::Subtitle, "subs.srt: 404");
    fatal.controller.drain_signals();
    assert_eq!(fatal.channel.count("error"), 1);
    assert!(!probe.play_when_ready());
}

#[test]
fn test_key_and_touch_input() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4"));
    h.controller.drain_signals();
    h.channel.clear();

    h.surfaces.raise(SurfaceSignal::Key {
        code: "KEYCODE_VOLUME_UP".to_string(),
        action: KeyAction::Down,
    });
    h.surfaces.raise(SurfaceSignal::Key {
        code: "KEYCODE_DPAD_CENTER".to_string(),
        action: KeyAction::Up,
    });
    h.surfaces.raise(SurfaceSignal::Touch { action: TouchAction::Down });
    h.surfaces.raise(SurfaceSignal::Touch { action: TouchAction::Move });
    h.surfaces.raise(SurfaceSignal::Touch { action: TouchAction::Move });
    h.surfaces.raise(SurfaceSignal::Touch { action: TouchAction::Up });
    h.controller.drain_signals();

    assert_eq!(
        h.channel.events(),
        vec![
            Event::KeyPress {
                code: "KEYCODE_DPAD_CENTER".to_string(),
                action: KeyAction::Up
            },
            Event::Touch { action: TouchAction::Down },
            Event::Touch { action: TouchAction::Move },
            Event::Touch { action: TouchAction::Up },
        ]
    );
    // Key-up plus every touch shows the controller
    assert_eq!(h.surfaces.log().controller_shown, 5);
}

#[test]
fn test_events_serialize_for_client() {
    let mut h = harness(Some(10_000));
    h.controller.create_session(SessionConfig::new("http://x/video.mp4").audio_only(true));
    h.controller.seek_to(-500);

    let records = h.channel.records();
    let json: serde_json::Value = serde_json::from_str(&records.last().unwrap().to_json()).unwrap();
    assert_eq!(json["type"], "seek");
    assert_eq!(json["requestedMs"], -500);
    assert_eq!(json["sessionId"], h.controller.id().to_string());
    assert_eq!(json["state"]["positionMs"], 0);
}

// =============================================================================
// Host Options and Handle Tests
// =============================================================================

#[test]
fn test_host_options_drive_session() {
    let json = r#"{
        "url": "https://example.com/vod/master.m3u8",
        "playOffset": 3000,
        "subtitleUrl": "https://example.com/vod/en.srt",
        "controller": { "streamTitle": "Pilot" }
    }"#;
    let config = tokio_test::assert_ok!(SessionConfig::from_json(json));

    let descriptor = tokio_test::assert_ok!(resolve(&config.uri, &config));
    assert_eq!(descriptor.kind, StreamKind::Hls);
    assert_eq!(
        descriptor.subtitle.as_ref().map(|s| s.format),
        Some(SubtitleFormat::SubRip)
    );

    let mut h = harness(Some(60_000));
    h.controller.create_session(config);
    assert_eq!(h.controller.lifecycle(), Lifecycle::Presenting);
    assert_eq!(h.engines.latest().unwrap().seeks(), vec![3_000]);
    assert_eq!(
        h.surfaces.log().controller_options[0].stream_title.as_deref(),
        Some("Pilot")
    );
}

#[test]
fn test_handle_on_current_thread_runtime() {
    tokio_test::block_on(async {
        let h = harness(Some(10_000));
        let engines = h.engines.clone();
        let (handle, task) = playbridge_core::SessionHandle::spawn(h.controller);

        handle.create_session(SessionConfig::new("http://x/song.mp3").audio_only(true));
        handle.seek_to(4_000);
        assert_eq!(handle.lifecycle().await, Lifecycle::Presenting);
        assert_eq!(engines.latest().unwrap().seeks(), vec![4_000]);

        handle.close().await;
        drop(handle);
        tokio_test::assert_ok!(task.await);
        assert_eq!(h.channel.count("start"), 1);
        assert_eq!(h.channel.count("stop"), 1);
    });
}
