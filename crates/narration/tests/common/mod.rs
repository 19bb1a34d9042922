//! Recording mock capabilities shared by the narration integration tests

#![allow(dead_code)]

use fabletime_core::{StaticCatalog, Story, StoryId};
use fabletime_store::{MemoryStore, UserLibrary};
use narration_engine::{
    AudioFocus, AudioRecorder, AutoAdvance, CaptureHandle, ClipHandle, ClipPlayer, ClipTicket,
    NarrationController, NarrationError, NarrationResult, Permission, SpeechOptions,
    SpeechSynthesizer, UtteranceTicket, VoiceRecorder,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const HELLO: &str = "s1";
pub const ONCE: &str = "s2";
pub const SINGLE: &str = "s3";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Speak {
        text: String,
        pitch: f32,
        ticket: UtteranceTicket,
    },
    StopAll,
    LoadClip {
        location: PathBuf,
        start_ms: u64,
        ticket: ClipTicket,
    },
    PauseClip(ClipHandle),
    Seek(ClipHandle, u64),
    Unload(ClipHandle),
    RequestPermission,
    StartCapture(StoryId),
    StopCapture(CaptureHandle),
    CancelCapture(CaptureHandle),
    Release(PathBuf),
}

/// Every capability call in order
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    /// Texts passed to the speech capability
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Speak { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_utterance(&self) -> UtteranceTicket {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                Call::Speak { ticket, .. } => Some(ticket),
                _ => None,
            })
            .expect("nothing was spoken")
    }

    pub fn last_pitch(&self) -> f32 {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                Call::Speak { pitch, .. } => Some(pitch),
                _ => None,
            })
            .expect("nothing was spoken")
    }

    pub fn last_clip(&self) -> (u64, ClipTicket) {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                Call::LoadClip {
                    start_ms, ticket, ..
                } => Some((start_ms, ticket)),
                _ => None,
            })
            .expect("no clip was loaded")
    }

    pub fn released(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Release(path) => Some(path),
                _ => None,
            })
            .collect()
    }
}

pub struct MockSpeech {
    log: CallLog,
}

impl SpeechSynthesizer for MockSpeech {
    fn speak(
        &mut self,
        text: &str,
        options: &SpeechOptions,
        ticket: UtteranceTicket,
    ) -> NarrationResult<()> {
        self.log.push(Call::Speak {
            text: text.to_string(),
            pitch: options.pitch,
            ticket,
        });
        Ok(())
    }

    fn stop_all(&mut self) {
        self.log.push(Call::StopAll);
    }
}

pub struct MockClips {
    log: CallLog,
    position_ms: Arc<Mutex<u64>>,
    fail_load: Arc<AtomicBool>,
    next_handle: u64,
}

impl ClipPlayer for MockClips {
    fn load_and_play(
        &mut self,
        location: &Path,
        start_ms: u64,
        ticket: ClipTicket,
    ) -> NarrationResult<ClipHandle> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(NarrationError::capability("clip playback", "file missing"));
        }
        self.log.push(Call::LoadClip {
            location: location.to_path_buf(),
            start_ms,
            ticket,
        });
        self.next_handle += 1;
        Ok(ClipHandle(self.next_handle))
    }

    fn pause(&mut self, handle: ClipHandle) -> NarrationResult<u64> {
        self.log.push(Call::PauseClip(handle));
        Ok(*self.position_ms.lock().unwrap())
    }

    fn seek(&mut self, handle: ClipHandle, position_ms: u64) -> NarrationResult<()> {
        self.log.push(Call::Seek(handle, position_ms));
        Ok(())
    }

    fn unload(&mut self, handle: ClipHandle) {
        self.log.push(Call::Unload(handle));
    }
}

/// Paths containing "missing" report `NotFound` on release
pub struct MockRecorder {
    log: CallLog,
    permission: Arc<Mutex<Permission>>,
    fail_stop: Arc<AtomicBool>,
    next_handle: u64,
    captures: Vec<(CaptureHandle, StoryId)>,
}

impl AudioRecorder for MockRecorder {
    fn request_permission(&mut self) -> Permission {
        self.log.push(Call::RequestPermission);
        *self.permission.lock().unwrap()
    }

    fn start_capture(&mut self, story_id: &StoryId) -> NarrationResult<CaptureHandle> {
        self.log.push(Call::StartCapture(story_id.clone()));
        self.next_handle += 1;
        let handle = CaptureHandle(self.next_handle);
        self.captures.push((handle, story_id.clone()));
        Ok(handle)
    }

    fn stop_capture(&mut self, handle: CaptureHandle) -> NarrationResult<PathBuf> {
        self.log.push(Call::StopCapture(handle));
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(NarrationError::capability("recording", "encoder failed"));
        }
        let story = self
            .captures
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| NarrationError::capability("recording", "unknown capture"))?;
        Ok(PathBuf::from(format!(
            "/recordings/recording_{}_{}.wav",
            story, handle.0
        )))
    }

    fn cancel_capture(&mut self, handle: CaptureHandle) -> NarrationResult<()> {
        self.log.push(Call::CancelCapture(handle));
        Ok(())
    }

    fn release(&mut self, location: &Path) -> io::Result<()> {
        self.log.push(Call::Release(location.to_path_buf()));
        if location.to_string_lossy().contains("missing") {
            return Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        }
        Ok(())
    }
}

/// Knobs that reach inside the mocks after they are boxed
#[derive(Clone)]
pub struct Knobs {
    pub log: CallLog,
    pub clip_position_ms: Arc<Mutex<u64>>,
    pub clip_load_fails: Arc<AtomicBool>,
    pub permission: Arc<Mutex<Permission>>,
    pub capture_stop_fails: Arc<AtomicBool>,
}

impl Knobs {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            clip_position_ms: Arc::new(Mutex::new(0)),
            clip_load_fails: Arc::new(AtomicBool::new(false)),
            permission: Arc::new(Mutex::new(Permission::Granted)),
            capture_stop_fails: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn speech(&self) -> MockSpeech {
        MockSpeech {
            log: self.log.clone(),
        }
    }

    pub fn clips(&self) -> MockClips {
        MockClips {
            log: self.log.clone(),
            position_ms: Arc::clone(&self.clip_position_ms),
            fail_load: Arc::clone(&self.clip_load_fails),
            next_handle: 0,
        }
    }

    pub fn recorder(&self) -> MockRecorder {
        MockRecorder {
            log: self.log.clone(),
            permission: Arc::clone(&self.permission),
            fail_stop: Arc::clone(&self.capture_stop_fails),
            next_handle: 0,
            captures: Vec::new(),
        }
    }

    pub fn set_clip_position(&self, position_ms: u64) {
        *self.clip_position_ms.lock().unwrap() = position_ms;
    }

    pub fn set_permission(&self, permission: Permission) {
        *self.permission.lock().unwrap() = permission;
    }
}

pub fn stories() -> Vec<Story> {
    vec![
        Story::new(HELLO, "Hello", "Anon", "Classic", "Hello there. How are you? Fine!"),
        Story::new(ONCE, "Once", "Anon", "Magic", "Once upon a time. The end."),
        Story::new(SINGLE, "Single", "Anon", "Nature", "A single line"),
    ]
}

pub fn id(raw: &str) -> StoryId {
    StoryId::new(raw)
}

pub struct Harness {
    pub controller: NarrationController,
    pub recorder: VoiceRecorder,
    pub library: Arc<UserLibrary>,
    pub focus: AudioFocus,
    pub knobs: Knobs,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_stories(stories())
    }

    pub fn with_stories(stories: Vec<Story>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let knobs = Knobs::new();
        let library = Arc::new(UserLibrary::new(Arc::new(MemoryStore::new())));
        let catalog = Arc::new(StaticCatalog::new(stories).expect("valid catalog"));
        let focus = AudioFocus::new();

        let controller = NarrationController::new(
            Box::new(knobs.speech()),
            Box::new(knobs.clips()),
            Arc::clone(&library),
            catalog,
            focus.clone(),
        )
        .with_auto_advance(AutoAdvance::seeded(7));
        let recorder = VoiceRecorder::new(
            Box::new(knobs.recorder()),
            Arc::clone(&library),
            focus.clone(),
        );

        Self {
            controller,
            recorder,
            library,
            focus,
            knobs,
        }
    }

    pub fn log(&self) -> &CallLog {
        &self.knobs.log
    }

    /// Reports the unit currently being spoken as finished
    pub fn finish_unit(&mut self) {
        let ticket = self.knobs.log.last_utterance();
        self.controller
            .handle_event(narration_engine::NarrationEvent::speech_done(ticket));
    }
}
