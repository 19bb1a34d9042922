//! Narration controller
//!
//! Synchronous state machine for one story session at a time. Commands come
//! from the front end, capability callbacks arrive through
//! [`NarrationController::handle_event`]. Every command that cancels audio
//! bumps the generation, so callbacks issued before it are ignored.
//!
//! ```text
//!            load                 play                 unit done / clip status
//!   Empty ────────▶ Stopped ────────────────▶ Playing ──────────────┐
//!                     ▲  ▲      pause/mute/error  │  ◀───────────────┘
//!                     │  └────────────────────────┤
//!                     │         last unit done    ▼
//!                     └────────────────────── Finished ──▶ hand-off (auto-play)
//! ```

use crate::auto_advance::AutoAdvance;
use crate::capability::{
    ClipHandle, ClipPlayer, ClipTicket, NarrationEvent, SpeechOptions, SpeechOutcome,
    SpeechSynthesizer, UtteranceTicket,
};
use crate::error::{NarrationError, NarrationResult};
use crate::focus::{AudioFocus, FocusHolder};
use crate::recorder::RecordingStatus;
use crate::segmenter::segment;
use crate::sleep_timer::{SleepTick, SleepTimer, SleepTimerState};
use fabletime_config::NarrationConfig;
use fabletime_core::{
    AutoPlayMode, Catalog, PlaybackSource, Story, StoryId, VoiceGender, VoicePreference,
};
use fabletime_store::UserLibrary;
use std::sync::Arc;

/// Language, rate and per-gender pitch for synthesized speech
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub language: String,
    pub rate: f32,
    pub female_pitch: f32,
    pub male_pitch: f32,
}

impl SpeechSettings {
    pub fn from_config(config: &NarrationConfig) -> Self {
        Self {
            language: config.language.clone(),
            rate: config.speech_rate,
            female_pitch: config.female_pitch,
            male_pitch: config.male_pitch,
        }
    }

    pub fn options(&self, gender: VoiceGender) -> SpeechOptions {
        SpeechOptions {
            pitch: match gender {
                VoiceGender::Female => self.female_pitch,
                VoiceGender::Male => self.male_pitch,
            },
            rate: self.rate,
            language: self.language.clone(),
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self::from_config(&NarrationConfig::default())
    }
}

/// What a play request did
#[derive(Debug)]
pub enum PlayOutcome {
    Started(PlaybackSource),
    /// Muted, nothing loaded or already playing
    Ignored,
    /// The recording could not be played; speech is narrating instead
    FellBackToSpeech(NarrationError),
}

/// Things the front end may want to tell the listener about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationNotice {
    StoryLoaded { story_id: StoryId, title: String },
    SpeakingUnit { index: usize, total: usize, text: String },
    Finished { story_id: StoryId },
    HandedOff { from: StoryId, to: StoryId },
    SleepTimerExpired,
    FellBackToSpeech { reason: String },
    PlaybackFailed { reason: String },
}

/// Read-only view of narration and recording state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NarrationSnapshot {
    pub story_id: Option<StoryId>,
    pub title: Option<String>,
    pub unit_index: usize,
    pub unit_count: usize,
    pub source: PlaybackSource,
    pub is_playing: bool,
    pub is_muted: bool,
    pub auto_play: AutoPlayMode,
    pub recorded_position_ms: u64,
    pub sleep_timer: SleepTimerState,
    pub sleep_remaining_secs: u32,
    pub recording: Option<RecordingStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sounding {
    Speech,
    Clip(ClipHandle),
}

struct NarrationSession {
    story: Story,
    sentences: Vec<String>,
    current_unit: usize,
    source: PlaybackSource,
    /// Source chosen while audio was sounding, applied on the next play
    pending_source: Option<PlaybackSource>,
    recorded_position_ms: u64,
    sounding: Option<Sounding>,
}

pub struct NarrationController {
    speech: Box<dyn SpeechSynthesizer>,
    clips: Box<dyn ClipPlayer>,
    library: Arc<UserLibrary>,
    catalog: Arc<dyn Catalog>,
    focus: AudioFocus,
    auto_advance: AutoAdvance,
    settings: SpeechSettings,
    session: Option<NarrationSession>,
    sleep_timer: SleepTimer,
    auto_play: AutoPlayMode,
    muted: bool,
    generation: u64,
    notices: Vec<NarrationNotice>,
}

impl NarrationController {
    pub fn new(
        speech: Box<dyn SpeechSynthesizer>,
        clips: Box<dyn ClipPlayer>,
        library: Arc<UserLibrary>,
        catalog: Arc<dyn Catalog>,
        focus: AudioFocus,
    ) -> Self {
        Self {
            speech,
            clips,
            library,
            catalog,
            focus,
            auto_advance: AutoAdvance::from_entropy(),
            settings: SpeechSettings::default(),
            session: None,
            sleep_timer: SleepTimer::new(),
            auto_play: AutoPlayMode::Off,
            muted: false,
            generation: 0,
            notices: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: SpeechSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_auto_advance(mut self, auto_advance: AutoAdvance) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    pub fn with_auto_play(mut self, mode: AutoPlayMode) -> Self {
        self.auto_play = mode;
        self
    }

    // ===== Commands =====

    /// Makes `story` the current session, cancelling any audio in flight
    ///
    /// The sleep timer is left alone so it carries across hand-offs.
    pub fn load(&mut self, story: Story) {
        self.silence();

        let sentences = segment(&story.content);
        let source = self.derive_source(&story.id);
        log::info!(
            "Loaded '{}' ({} units, {} voice)",
            story.title,
            sentences.len(),
            source
        );

        self.notices.push(NarrationNotice::StoryLoaded {
            story_id: story.id.clone(),
            title: story.title.clone(),
        });
        self.session = Some(NarrationSession {
            story,
            sentences,
            current_unit: 0,
            source,
            pending_source: None,
            recorded_position_ms: 0,
            sounding: None,
        });
    }

    pub fn load_by_id(&mut self, id: &StoryId) -> NarrationResult<()> {
        let story = self
            .catalog
            .story(id)
            .cloned()
            .ok_or_else(|| NarrationError::StoryNotFound {
                story_id: id.clone(),
            })?;
        self.load(story);
        Ok(())
    }

    /// Starts or resumes narration
    ///
    /// Fails with [`NarrationError::AlreadyActive`] while a recording holds
    /// the audio focus.
    pub fn play(&mut self) -> NarrationResult<PlayOutcome> {
        if self.muted {
            log::debug!("Play ignored while muted");
            return Ok(PlayOutcome::Ignored);
        }

        let (story_id, source) = match &self.session {
            Some(s) if s.sounding.is_none() && !s.sentences.is_empty() => {
                (s.story.id.clone(), s.pending_source.unwrap_or(s.source))
            }
            _ => return Ok(PlayOutcome::Ignored),
        };

        self.focus.acquire(FocusHolder::Narration)?;

        if let Some(session) = self.session.as_mut() {
            session.source = source;
            session.pending_source = None;
        }

        let outcome = match source {
            PlaybackSource::Recorded => match self.start_clip(&story_id) {
                Ok(()) => PlayOutcome::Started(PlaybackSource::Recorded),
                Err(e) => {
                    log::warn!(
                        "Recorded narration unavailable for {}, using speech: {}",
                        story_id,
                        e
                    );
                    self.notices.push(NarrationNotice::FellBackToSpeech {
                        reason: e.to_string(),
                    });
                    if let Some(session) = self.session.as_mut() {
                        session.source = PlaybackSource::Synthesized;
                        session.pending_source = Some(PlaybackSource::Recorded);
                    }
                    self.start_speech()?;
                    PlayOutcome::FellBackToSpeech(e)
                }
            },
            PlaybackSource::Synthesized => {
                self.start_speech()?;
                PlayOutcome::Started(PlaybackSource::Synthesized)
            }
        };

        self.sleep_timer.on_playback_changed(true);
        Ok(outcome)
    }

    /// Stops audio but keeps the unit index and clip position
    ///
    /// A unit interrupted mid-sentence is spoken again from its start on
    /// resume.
    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(sounding) = session.sounding.take() else {
            return;
        };

        self.generation += 1;
        match sounding {
            Sounding::Speech => self.speech.stop_all(),
            Sounding::Clip(handle) => {
                match self.clips.pause(handle) {
                    Ok(position) => session.recorded_position_ms = position,
                    Err(e) => log::warn!(
                        "Could not read clip position, keeping {} ms: {}",
                        session.recorded_position_ms,
                        e
                    ),
                }
                self.clips.unload(handle);
            }
        }

        log::debug!(
            "Paused '{}' at unit {} / {} ms",
            session.story.title,
            session.current_unit,
            session.recorded_position_ms
        );
        self.sleep_timer.on_playback_changed(false);
        self.focus.release(FocusHolder::Narration);
    }

    pub fn toggle_play(&mut self) -> NarrationResult<PlayOutcome> {
        if self.is_playing() {
            self.pause();
            Ok(PlayOutcome::Ignored)
        } else {
            self.play()
        }
    }

    /// Goes back to the first unit (or the clip start) and plays
    ///
    /// A sounding clip is seeked in place only when the recording is still
    /// the chosen source; otherwise the story starts over from the new one.
    pub fn restart(&mut self) -> NarrationResult<PlayOutcome> {
        let Some(session) = self.session.as_mut() else {
            return Ok(PlayOutcome::Ignored);
        };

        let keeps_clip = session
            .pending_source
            .is_none_or(|source| source == PlaybackSource::Recorded);
        if let (Some(Sounding::Clip(handle)), true) = (session.sounding, keeps_clip) {
            match self.clips.seek(handle, 0) {
                Ok(()) => {
                    session.recorded_position_ms = 0;
                    session.current_unit = 0;
                    log::debug!("Restarted clip for '{}'", session.story.title);
                    return Ok(PlayOutcome::Started(PlaybackSource::Recorded));
                }
                Err(e) => log::warn!("Clip seek failed, reloading: {}", e),
            }
        }

        self.silence();
        if let Some(session) = self.session.as_mut() {
            session.current_unit = 0;
            session.recorded_position_ms = 0;
        }
        self.play()
    }

    /// Flips mute; muting while playing stops audio outright
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if self.muted && self.is_playing() {
            self.silence();
            log::info!("Muted, narration stopped");
        }
        self.muted
    }

    /// Chooses the source for the next play
    ///
    /// While audio is sounding the choice is held back until the next play
    /// or restart.
    pub fn set_playback_source(&mut self, preference: VoicePreference, has_recording: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let source = PlaybackSource::resolve(preference, has_recording);
        if session.sounding.is_some() {
            log::debug!("Source change to {} deferred until playback stops", source);
            session.pending_source = Some(source);
            return;
        }

        session.pending_source = None;
        if source != session.source {
            log::info!("Playback source for '{}' is now {}", session.story.title, source);
            session.source = source;
        }
    }

    /// Re-derives the source from the stored preference and recordings
    pub fn refresh_source(&mut self) {
        let Some(story_id) = self.current_story_id() else {
            return;
        };
        let preference = self.library.voice_preference();
        let has_recording = self.library.has_recording(&story_id);
        self.set_playback_source(preference, has_recording);
    }

    /// Reacts to a recording for `story_id` being saved, replaced or deleted
    pub fn on_recordings_changed(&mut self, story_id: &StoryId) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if &session.story.id != story_id {
            return;
        }

        if matches!(session.sounding, Some(Sounding::Clip(_))) {
            self.silence();
        }
        if let Some(session) = self.session.as_mut() {
            session.recorded_position_ms = 0;
        }
        self.refresh_source();
    }

    pub fn set_auto_play(&mut self, mode: AutoPlayMode) {
        log::debug!("Auto-play set to {}", mode);
        self.auto_play = mode;
    }

    pub fn cycle_auto_play(&mut self) -> AutoPlayMode {
        self.set_auto_play(self.auto_play.cycle());
        self.auto_play
    }

    /// Arms the sleep timer; 0 disables it
    pub fn set_sleep_timer(&mut self, minutes: u32) {
        let playing = self.is_playing();
        self.sleep_timer.arm(minutes, playing);
    }

    /// One second of sleep timer; stops narration when it runs out
    pub fn tick_sleep_timer(&mut self) -> SleepTick {
        let tick = self.sleep_timer.tick();
        if tick == SleepTick::Expired {
            log::info!("Sleep timer ended, stopping narration");
            self.pause();
            self.notices.push(NarrationNotice::SleepTimerExpired);
        }
        tick
    }

    /// Stops all audio and disarms the sleep timer
    pub fn shutdown(&mut self) {
        self.silence();
        self.sleep_timer.disable();
    }

    // ===== Capability callbacks =====

    pub fn handle_event(&mut self, event: NarrationEvent) {
        match event {
            NarrationEvent::Speech { ticket, outcome } => self.on_speech(ticket, outcome),
            NarrationEvent::ClipStatus {
                ticket,
                position_ms,
                did_finish,
            } => self.on_clip_status(ticket, position_ms, did_finish),
            NarrationEvent::ClipError { ticket, reason } => {
                if self.clip_ticket_is_current(ticket) {
                    log::warn!("Clip playback failed: {}", reason);
                    self.fail(NarrationError::capability("clip playback", reason));
                }
            }
        }
    }

    fn on_speech(&mut self, ticket: UtteranceTicket, outcome: SpeechOutcome) {
        let speaking_unit = self
            .session
            .as_ref()
            .filter(|s| s.sounding == Some(Sounding::Speech))
            .map(|s| s.current_unit);

        if ticket.generation != self.generation || speaking_unit != Some(ticket.unit) {
            log::debug!("Ignoring stale speech callback {:?}", ticket);
            return;
        }

        match outcome {
            SpeechOutcome::Done => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                session.current_unit += 1;
                if session.current_unit < session.sentences.len() {
                    if let Err(e) = self.speak_current() {
                        self.fail(e);
                    }
                } else {
                    self.finish();
                }
            }
            SpeechOutcome::Stopped => {
                log::debug!("Speech stopped by the engine at unit {}", ticket.unit);
                self.silence();
            }
            SpeechOutcome::Error(reason) => {
                log::warn!("Speech failed at unit {}: {}", ticket.unit, reason);
                self.fail(NarrationError::capability("speech", reason));
            }
        }
    }

    fn on_clip_status(&mut self, ticket: ClipTicket, position_ms: u64, did_finish: bool) {
        if !self.clip_ticket_is_current(ticket) {
            log::debug!("Ignoring stale clip status {:?}", ticket);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.recorded_position_ms = position_ms;
        if did_finish {
            self.finish();
        }
    }

    fn clip_ticket_is_current(&self, ticket: ClipTicket) -> bool {
        ticket.generation == self.generation
            && self
                .session
                .as_ref()
                .is_some_and(|s| matches!(s.sounding, Some(Sounding::Clip(_))))
    }

    // ===== Transitions =====

    fn start_speech(&mut self) -> NarrationResult<()> {
        if let Some(session) = self.session.as_mut() {
            session.sounding = Some(Sounding::Speech);
        }
        if let Err(e) = self.speak_current() {
            log::warn!("Speech failed to start: {}", e);
            self.silence();
            return Err(e);
        }
        Ok(())
    }

    fn speak_current(&mut self) -> NarrationResult<()> {
        let options = self.settings.options(self.library.voice_gender());
        let generation = self.generation;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let unit = session.current_unit;
        let Some(text) = session.sentences.get(unit) else {
            return Ok(());
        };

        log::debug!("Speaking unit {}/{}", unit + 1, session.sentences.len());
        self.notices.push(NarrationNotice::SpeakingUnit {
            index: unit,
            total: session.sentences.len(),
            text: text.clone(),
        });
        self.speech
            .speak(text, &options, UtteranceTicket { generation, unit })
    }

    fn start_clip(&mut self, story_id: &StoryId) -> NarrationResult<()> {
        let recording =
            self.library
                .recording(story_id)
                .ok_or_else(|| NarrationError::MissingRecording {
                    story_id: story_id.clone(),
                })?;
        let ticket = ClipTicket {
            generation: self.generation,
        };
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let handle =
            self.clips
                .load_and_play(&recording.location, session.recorded_position_ms, ticket)?;
        session.sounding = Some(Sounding::Clip(handle));
        log::info!(
            "Playing recording {} from {} ms",
            recording.location.display(),
            session.recorded_position_ms
        );
        Ok(())
    }

    /// Natural end of the story: rewind, then hand off if auto-play is on
    fn finish(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.current_unit = 0;
        session.recorded_position_ms = 0;
        let story_id = session.story.id.clone();
        log::info!("Finished '{}'", session.story.title);

        self.silence();
        self.notices.push(NarrationNotice::Finished {
            story_id: story_id.clone(),
        });

        if self.auto_play == AutoPlayMode::Off {
            return;
        }
        let next = self
            .auto_advance
            .next(&story_id, self.auto_play, self.catalog.stories())
            .cloned();
        if let Some(next) = next {
            self.hand_off(story_id, next);
        }
    }

    fn hand_off(&mut self, from: StoryId, next: Story) {
        log::info!(
            "Auto-play handing off from {} to {} ({} left on sleep timer)",
            from,
            next.id,
            self.sleep_timer.remaining()
        );
        let to = next.id.clone();
        self.load(next);
        self.notices.push(NarrationNotice::HandedOff { from, to });

        if self.muted {
            return;
        }
        if let Err(e) = self.play() {
            log::warn!("Could not start the next story: {}", e);
            self.notices.push(NarrationNotice::PlaybackFailed {
                reason: e.to_string(),
            });
        }
    }

    /// Capability failure: stop in place without advancing
    fn fail(&mut self, error: NarrationError) {
        self.silence();
        self.notices.push(NarrationNotice::PlaybackFailed {
            reason: error.to_string(),
        });
    }

    /// Cancels whatever is sounding and invalidates outstanding callbacks
    fn silence(&mut self) {
        self.generation += 1;
        if let Some(session) = self.session.as_mut() {
            match session.sounding.take() {
                Some(Sounding::Speech) => self.speech.stop_all(),
                Some(Sounding::Clip(handle)) => self.clips.unload(handle),
                None => {}
            }
        }
        self.sleep_timer.on_playback_changed(false);
        self.focus.release(FocusHolder::Narration);
    }

    fn derive_source(&self, story_id: &StoryId) -> PlaybackSource {
        PlaybackSource::resolve(
            self.library.voice_preference(),
            self.library.has_recording(story_id),
        )
    }

    // ===== Queries =====

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.sounding.is_some())
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn story(&self) -> Option<&Story> {
        self.session.as_ref().map(|s| &s.story)
    }

    pub fn current_story_id(&self) -> Option<StoryId> {
        self.story().map(|s| s.id.clone())
    }

    pub fn units(&self) -> &[String] {
        self.session
            .as_ref()
            .map(|s| s.sentences.as_slice())
            .unwrap_or_default()
    }

    pub fn current_unit(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.current_unit)
    }

    pub fn playback_source(&self) -> PlaybackSource {
        self.session
            .as_ref()
            .map(|s| s.source)
            .unwrap_or_default()
    }

    pub fn recorded_position_ms(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.recorded_position_ms)
    }

    pub fn auto_play(&self) -> AutoPlayMode {
        self.auto_play
    }

    pub fn sleep_timer(&self) -> &SleepTimer {
        &self.sleep_timer
    }

    pub fn library(&self) -> &Arc<UserLibrary> {
        &self.library
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Takes the notices produced since the last call
    pub fn drain_notices(&mut self) -> Vec<NarrationNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn snapshot(&self) -> NarrationSnapshot {
        let session = self.session.as_ref();
        NarrationSnapshot {
            story_id: session.map(|s| s.story.id.clone()),
            title: session.map(|s| s.story.title.clone()),
            unit_index: self.current_unit(),
            unit_count: self.units().len(),
            source: self.playback_source(),
            is_playing: self.is_playing(),
            is_muted: self.muted,
            auto_play: self.auto_play,
            recorded_position_ms: self.recorded_position_ms(),
            sleep_timer: self.sleep_timer.state(),
            sleep_remaining_secs: self.sleep_timer.remaining_secs(),
            recording: None,
        }
    }
}

impl Drop for NarrationController {
    fn drop(&mut self) {
        if self.is_playing() {
            self.silence();
        }
    }
}
