//! Integration tests for the narration controller

mod common;

use common::{id, Call, Harness, HELLO, ONCE, SINGLE};
use fabletime_core::{AutoPlayMode, PlaybackSource, SavedRecording, VoiceGender, VoicePreference};
use narration_engine::{
    FocusHolder, NarrationError, NarrationEvent, NarrationNotice, PlayOutcome, SleepTick,
    SleepTimerState,
};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

fn save_recording(harness: &Harness, story: &str, location: &str) {
    harness
        .library
        .save_recording(SavedRecording::new(id(story), PathBuf::from(location), 12))
        .expect("save recording");
}

#[test]
fn test_hello_story_pause_and_resume_respeaks_unit() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).expect("load");
    assert_eq!(h.controller.units().len(), 3);

    let outcome = h.controller.play().expect("play");
    assert!(matches!(
        outcome,
        PlayOutcome::Started(PlaybackSource::Synthesized)
    ));
    assert_eq!(h.log().spoken(), vec!["Hello there."]);

    h.finish_unit();
    assert_eq!(h.controller.current_unit(), 1);
    assert_eq!(h.log().spoken(), vec!["Hello there.", "How are you?"]);
    let interrupted = h.log().last_utterance();

    h.controller.pause();
    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.current_unit(), 1);

    // completion of the interrupted unit arrives late
    h.controller
        .handle_event(NarrationEvent::speech_done(interrupted));
    assert_eq!(h.controller.current_unit(), 1);

    h.controller.play().expect("resume");
    assert_eq!(
        h.log().spoken(),
        vec!["Hello there.", "How are you?", "How are you?"]
    );

    h.finish_unit();
    assert_eq!(h.controller.current_unit(), 2);
    h.finish_unit();

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.current_unit(), 0);
    assert_eq!(h.log().spoken().len(), 4);

    let notices = h.controller.drain_notices();
    assert!(notices.contains(&NarrationNotice::Finished {
        story_id: id(HELLO)
    }));
    assert!(!notices
        .iter()
        .any(|n| matches!(n, NarrationNotice::HandedOff { .. })));
}

#[test]
fn test_unit_index_moves_only_on_completion() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        h.controller.play().unwrap();
        seen.push(h.controller.current_unit());
        h.controller.pause();
        seen.push(h.controller.current_unit());
    }
    assert!(seen.iter().all(|&unit| unit == 0));

    h.controller.play().unwrap();
    h.finish_unit();
    h.controller.pause();
    h.controller.play().unwrap();
    assert_eq!(h.controller.current_unit(), 1);
}

#[test]
fn test_restart_goes_back_to_first_unit() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();
    h.finish_unit();
    assert_eq!(h.controller.current_unit(), 2);

    h.controller.restart().unwrap();

    assert!(h.controller.is_playing());
    assert_eq!(h.controller.current_unit(), 0);
    assert_eq!(h.log().spoken().last().map(String::as_str), Some("Hello there."));
}

#[test]
fn test_restart_from_stopped_plays_from_start() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();
    h.controller.pause();

    h.controller.restart().unwrap();
    assert_eq!(h.controller.current_unit(), 0);
    assert!(h.controller.is_playing());
}

#[test]
fn test_play_without_story_is_ignored() {
    let mut h = Harness::new();
    assert!(matches!(h.controller.play(), Ok(PlayOutcome::Ignored)));
    assert!(h.log().calls().is_empty());
}

#[test]
fn test_play_while_playing_is_ignored() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    assert!(matches!(h.controller.play(), Ok(PlayOutcome::Ignored)));
    assert_eq!(h.log().spoken().len(), 1);
}

#[test]
fn test_unknown_story_id() {
    let mut h = Harness::new();
    let err = h.controller.load_by_id(&id("nope")).unwrap_err();
    assert!(matches!(err, NarrationError::StoryNotFound { .. }));
    assert!(h.controller.story().is_none());
}

#[test]
fn test_mute_stops_and_blocks_play() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();

    assert!(h.controller.toggle_mute());
    assert!(!h.controller.is_playing());
    assert_eq!(h.log().count(|c| *c == Call::StopAll), 1);
    assert_eq!(h.focus.holder(), None);

    assert!(matches!(h.controller.play(), Ok(PlayOutcome::Ignored)));
    assert!(!h.controller.is_playing());

    assert!(!h.controller.toggle_mute());
    h.controller.play().unwrap();
    assert_eq!(h.controller.current_unit(), 1);
    assert_eq!(h.log().spoken().last().map(String::as_str), Some("How are you?"));
}

#[test]
fn test_callbacks_from_previous_story_are_ignored() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    let old = h.log().last_utterance();

    h.controller.load_by_id(&id(ONCE)).unwrap();
    h.controller.handle_event(NarrationEvent::speech_done(old));
    h.controller
        .handle_event(NarrationEvent::speech_error(old, "late failure"));

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.current_unit(), 0);
    assert_eq!(h.log().spoken(), vec!["Hello there."]);
    assert!(!h
        .controller
        .drain_notices()
        .iter()
        .any(|n| matches!(n, NarrationNotice::PlaybackFailed { .. })));
}

#[test]
fn test_speech_error_stops_without_advancing() {
    let mut h = Harness::new();
    h.controller.set_auto_play(AutoPlayMode::Sequential);
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();

    let ticket = h.log().last_utterance();
    h.controller
        .handle_event(NarrationEvent::speech_error(ticket, "engine crashed"));

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.current_unit(), 1);
    assert_eq!(h.controller.current_story_id(), Some(id(HELLO)));
    assert_eq!(h.focus.holder(), None);
    assert!(h
        .controller
        .drain_notices()
        .iter()
        .any(|n| matches!(n, NarrationNotice::PlaybackFailed { .. })));
}

#[test]
fn test_engine_stopped_callback_halts_in_place() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();

    let ticket = h.log().last_utterance();
    h.controller
        .handle_event(NarrationEvent::speech_stopped(ticket));

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.current_unit(), 1);
}

#[test]
fn test_sequential_hand_off_wraps_and_autostarts() {
    let mut h = Harness::new();
    h.controller.set_auto_play(AutoPlayMode::Sequential);
    h.controller.load_by_id(&id(SINGLE)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();

    assert_eq!(h.controller.current_story_id(), Some(id(HELLO)));
    assert!(h.controller.is_playing());
    assert_eq!(h.log().spoken(), vec!["A single line", "Hello there."]);

    let notices = h.controller.drain_notices();
    assert!(notices.contains(&NarrationNotice::HandedOff {
        from: id(SINGLE),
        to: id(HELLO)
    }));
}

#[test]
fn test_shuffle_never_repeats_current_story() {
    let mut h = Harness::new();
    h.controller.set_auto_play(AutoPlayMode::Shuffle);
    h.controller.load_by_id(&id(SINGLE)).unwrap();
    h.controller.play().unwrap();

    for _ in 0..20 {
        let before = h.controller.current_story_id().unwrap();
        let units = h.controller.units().len();
        for _ in 0..units {
            h.finish_unit();
        }
        let after = h.controller.current_story_id().unwrap();
        assert_ne!(before, after);
        assert!(h.controller.is_playing());
    }
}

#[test]
fn test_single_story_catalog_shuffle_replays_it() {
    let stories = vec![common::stories().remove(2)];
    let mut h = Harness::with_stories(stories);
    h.controller.set_auto_play(AutoPlayMode::Shuffle);
    h.controller.load_by_id(&id(SINGLE)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();

    assert_eq!(h.controller.current_story_id(), Some(id(SINGLE)));
    assert!(h.controller.is_playing());
    assert_eq!(h.log().spoken().len(), 2);
}

#[test]
fn test_cycle_auto_play() {
    let mut h = Harness::new();
    assert_eq!(h.controller.cycle_auto_play(), AutoPlayMode::Sequential);
    assert_eq!(h.controller.cycle_auto_play(), AutoPlayMode::Shuffle);
    assert_eq!(h.controller.cycle_auto_play(), AutoPlayMode::Off);
}

#[test]
fn test_gender_change_applies_to_next_unit() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    assert_eq!(h.log().last_pitch(), 1.15);

    h.library.set_voice_gender(VoiceGender::Male).unwrap();
    h.finish_unit();
    assert_eq!(h.log().last_pitch(), 0.25);
}

// ===== Recorded source =====

#[test]
fn test_recording_then_delete_switches_source() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();

    h.controller.load_by_id(&id(HELLO)).unwrap();
    assert_eq!(h.controller.playback_source(), PlaybackSource::Recorded);

    h.library.remove_recording(&id(HELLO)).unwrap();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    assert_eq!(h.controller.playback_source(), PlaybackSource::Synthesized);
}

#[test]
fn test_ai_preference_ignores_recording() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");

    h.controller.load_by_id(&id(HELLO)).unwrap();
    assert_eq!(h.controller.playback_source(), PlaybackSource::Synthesized);
}

#[test]
fn test_recorded_pause_resumes_from_position() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();
    h.controller.load_by_id(&id(HELLO)).unwrap();

    let outcome = h.controller.play().unwrap();
    assert!(matches!(outcome, PlayOutcome::Started(PlaybackSource::Recorded)));
    let (start, ticket) = h.log().last_clip();
    assert_eq!(start, 0);

    h.controller
        .handle_event(NarrationEvent::clip_position(ticket, 3_900));
    assert_eq!(h.controller.recorded_position_ms(), 3_900);

    h.knobs.set_clip_position(4_200);
    h.controller.pause();
    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.recorded_position_ms(), 4_200);
    assert!(h.log().calls().iter().any(|c| matches!(c, Call::Unload(_))));

    h.controller.play().unwrap();
    assert_eq!(h.log().last_clip().0, 4_200);
    assert!(h.log().spoken().is_empty());
}

#[test]
fn test_recorded_finish_resets_offset() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    let (_, ticket) = h.log().last_clip();

    h.controller
        .handle_event(NarrationEvent::clip_finished(ticket, 12_000));

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.recorded_position_ms(), 0);
    assert_eq!(h.focus.holder(), None);
}

#[test]
fn test_restart_seeks_sounding_clip() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    let (_, ticket) = h.log().last_clip();
    h.controller
        .handle_event(NarrationEvent::clip_position(ticket, 7_000));

    h.controller.restart().unwrap();

    assert!(h.controller.is_playing());
    assert_eq!(h.controller.recorded_position_ms(), 0);
    assert!(h
        .log()
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Seek(_, 0))));
}

#[test]
fn test_clip_failure_falls_back_to_speech() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/gone.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();
    h.knobs.clip_load_fails.store(true, Ordering::SeqCst);
    h.controller.load_by_id(&id(HELLO)).unwrap();

    let outcome = h.controller.play().unwrap();

    match outcome {
        PlayOutcome::FellBackToSpeech(err) => assert!(err.is_recoverable()),
        other => panic!("expected fallback, got {:?}", other),
    }
    assert!(h.controller.is_playing());
    assert_eq!(h.controller.playback_source(), PlaybackSource::Synthesized);
    assert_eq!(h.log().spoken(), vec!["Hello there."]);
    assert!(h
        .controller
        .drain_notices()
        .iter()
        .any(|n| matches!(n, NarrationNotice::FellBackToSpeech { .. })));
}

#[test]
fn test_clip_error_event_stops_playback() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    let (_, ticket) = h.log().last_clip();

    h.controller.handle_event(NarrationEvent::ClipError {
        ticket,
        reason: "decoder failed".to_string(),
    });

    assert!(!h.controller.is_playing());
}

#[test]
fn test_source_change_deferred_while_playing() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();

    h.controller
        .set_playback_source(VoicePreference::Custom, true);
    assert_eq!(h.controller.playback_source(), PlaybackSource::Synthesized);

    h.controller.pause();
    h.controller
        .set_playback_source(VoicePreference::Custom, true);
    assert_eq!(h.controller.playback_source(), PlaybackSource::Recorded);
}

#[test]
fn test_chosen_source_drives_next_play() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.controller.load_by_id(&id(HELLO)).unwrap();
    assert_eq!(h.controller.playback_source(), PlaybackSource::Synthesized);

    h.controller
        .set_playback_source(VoicePreference::Custom, true);
    let outcome = h.controller.play().unwrap();

    assert!(matches!(outcome, PlayOutcome::Started(PlaybackSource::Recorded)));
    assert_eq!(h.controller.playback_source(), PlaybackSource::Recorded);
    assert!(h.log().spoken().is_empty());
}

#[test]
fn test_deferred_source_applies_after_pause() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();

    h.controller
        .set_playback_source(VoicePreference::Custom, true);
    h.controller.pause();
    let outcome = h.controller.play().unwrap();

    assert!(matches!(outcome, PlayOutcome::Started(PlaybackSource::Recorded)));
    assert_eq!(h.log().last_clip().0, 0);
}

#[test]
fn test_restart_switches_to_ai_voice_chosen_mid_clip() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();

    h.library.set_voice_preference(VoicePreference::Ai).unwrap();
    h.controller.refresh_source();
    assert_eq!(h.controller.playback_source(), PlaybackSource::Recorded);

    let outcome = h.controller.restart().unwrap();

    assert!(matches!(
        outcome,
        PlayOutcome::Started(PlaybackSource::Synthesized)
    ));
    assert_eq!(h.controller.playback_source(), PlaybackSource::Synthesized);
    assert_eq!(h.log().spoken(), vec!["Hello there."]);
    assert!(!h
        .log()
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Seek(_, _))));
}

#[test]
fn test_deleting_sounding_recording_stops_clip() {
    let mut h = Harness::new();
    save_recording(&h, HELLO, "/recordings/hello.wav");
    h.library
        .set_voice_preference(VoicePreference::Custom)
        .unwrap();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();

    h.library.remove_recording(&id(HELLO)).unwrap();
    h.controller.on_recordings_changed(&id(HELLO));

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.playback_source(), PlaybackSource::Synthesized);
}

// ===== Sleep timer =====

#[test]
fn test_sleep_timer_expiry_stops_narration() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.controller.set_sleep_timer(1);

    for _ in 0..59 {
        assert!(matches!(
            h.controller.tick_sleep_timer(),
            SleepTick::Counting(_)
        ));
    }
    assert_eq!(h.controller.tick_sleep_timer(), SleepTick::Expired);

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.sleep_timer().state(), SleepTimerState::Disabled);
    let expired = h
        .controller
        .drain_notices()
        .into_iter()
        .filter(|n| *n == NarrationNotice::SleepTimerExpired)
        .count();
    assert_eq!(expired, 1);
    assert_eq!(h.controller.tick_sleep_timer(), SleepTick::Idle);
}

#[test]
fn test_sleep_timer_carries_across_hand_off() {
    let mut h = Harness::new();
    h.controller.set_auto_play(AutoPlayMode::Sequential);
    h.controller.load_by_id(&id(SINGLE)).unwrap();
    h.controller.play().unwrap();
    h.controller.set_sleep_timer(5);
    for _ in 0..10 {
        h.controller.tick_sleep_timer();
    }

    h.finish_unit();

    assert_eq!(h.controller.current_story_id(), Some(id(HELLO)));
    assert_eq!(h.controller.sleep_timer().remaining_secs(), 290);
    assert!(h.controller.sleep_timer().is_running());
}

#[test]
fn test_sleep_timer_armed_until_play() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.set_sleep_timer(10);
    assert_eq!(h.controller.sleep_timer().state(), SleepTimerState::Armed);

    h.controller.play().unwrap();
    assert_eq!(h.controller.sleep_timer().state(), SleepTimerState::Running);

    h.controller.pause();
    assert_eq!(h.controller.sleep_timer().state(), SleepTimerState::Armed);
    assert_eq!(h.controller.sleep_timer().remaining_secs(), 600);
}

// ===== Audio focus =====

#[test]
fn test_play_blocked_while_recording() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.recorder.start(&id(HELLO)).unwrap();

    let err = h.controller.play().unwrap_err();
    assert!(matches!(
        err,
        NarrationError::AlreadyActive {
            holder: FocusHolder::Recording
        }
    ));
    assert!(!h.controller.is_playing());
    assert!(h.log().spoken().is_empty());
}

#[test]
fn test_snapshot_reflects_state() {
    let mut h = Harness::new();
    h.controller.set_auto_play(AutoPlayMode::Shuffle);
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.finish_unit();

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.story_id, Some(id(HELLO)));
    assert_eq!(snapshot.title.as_deref(), Some("Hello"));
    assert_eq!(snapshot.unit_index, 1);
    assert_eq!(snapshot.unit_count, 3);
    assert!(snapshot.is_playing);
    assert!(!snapshot.is_muted);
    assert_eq!(snapshot.auto_play, AutoPlayMode::Shuffle);
    assert_eq!(snapshot.sleep_timer, SleepTimerState::Disabled);
}

#[test]
fn test_shutdown_silences_and_disarms() {
    let mut h = Harness::new();
    h.controller.load_by_id(&id(HELLO)).unwrap();
    h.controller.play().unwrap();
    h.controller.set_sleep_timer(5);

    h.controller.shutdown();

    assert!(!h.controller.is_playing());
    assert_eq!(h.controller.sleep_timer().state(), SleepTimerState::Disabled);
    assert_eq!(h.focus.holder(), None);
}
