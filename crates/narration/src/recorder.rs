//! Voice recording session
//!
//! `idle -> recording -> idle`, ending either in a saved recording or a
//! discarded capture. Holds the audio focus for the whole capture, so it
//! cannot overlap narration playback.

use crate::capability::{AudioRecorder, CaptureHandle, Permission};
use crate::error::{NarrationError, NarrationResult};
use crate::focus::{AudioFocus, FocusHolder};
use fabletime_core::{Duration, SavedRecording, StoryId, Timestamp};
use fabletime_store::UserLibrary;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Progress of the capture in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStatus {
    pub story_id: StoryId,
    pub elapsed_secs: u64,
}

impl RecordingStatus {
    pub fn elapsed(&self) -> Duration {
        Duration::from_seconds(self.elapsed_secs)
    }
}

struct RecordingSession {
    story_id: StoryId,
    started_at: Timestamp,
    elapsed_secs: u64,
    handle: CaptureHandle,
}

pub struct VoiceRecorder {
    capture: Box<dyn AudioRecorder>,
    library: Arc<UserLibrary>,
    focus: AudioFocus,
    permission_granted: bool,
    session: Option<RecordingSession>,
}

impl VoiceRecorder {
    pub fn new(capture: Box<dyn AudioRecorder>, library: Arc<UserLibrary>, focus: AudioFocus) -> Self {
        Self {
            capture,
            library,
            focus,
            permission_granted: false,
            session: None,
        }
    }

    /// Begins capturing a narration of `story_id`
    ///
    /// Asks for microphone permission until it is granted once.
    pub fn start(&mut self, story_id: &StoryId) -> NarrationResult<()> {
        if self.session.is_some() {
            return Err(NarrationError::AlreadyActive {
                holder: FocusHolder::Recording,
            });
        }

        if !self.permission_granted {
            log::info!("Requesting microphone permission");
            match self.capture.request_permission() {
                Permission::Granted => self.permission_granted = true,
                Permission::Denied => return Err(NarrationError::PermissionDenied),
            }
        }

        self.focus.acquire(FocusHolder::Recording)?;

        let handle = match self.capture.start_capture(story_id) {
            Ok(handle) => handle,
            Err(e) => {
                self.focus.release(FocusHolder::Recording);
                return Err(e);
            }
        };

        log::info!("Recording started for story {}", story_id);
        self.session = Some(RecordingSession {
            story_id: story_id.clone(),
            started_at: Timestamp::now(),
            elapsed_secs: 0,
            handle,
        });
        Ok(())
    }

    /// Finalizes the capture and saves it as the story's recording
    ///
    /// A previous recording for the same story is replaced and its file
    /// released.
    pub fn stop(&mut self) -> NarrationResult<SavedRecording> {
        let session = self.session.take().ok_or(NarrationError::NotRecording)?;
        let result = self.finalize(&session);
        self.focus.release(FocusHolder::Recording);
        result
    }

    fn finalize(&mut self, session: &RecordingSession) -> NarrationResult<SavedRecording> {
        let location = match self.capture.stop_capture(session.handle) {
            Ok(location) => location,
            Err(e) => {
                if let Err(cancel) = self.capture.cancel_capture(session.handle) {
                    log::debug!("Discarding failed capture: {}", cancel);
                }
                return Err(e);
            }
        };
        let recording = SavedRecording {
            story_id: session.story_id.clone(),
            location,
            duration_secs: session.elapsed_secs,
            created_at: session.started_at,
        };

        let previous = match self.library.save_recording(recording.clone()) {
            Ok(previous) => previous,
            Err(e) => {
                self.release_file(&recording.location);
                return Err(e.into());
            }
        };

        if let Some(old) = previous.filter(|old| old.location != recording.location) {
            self.release_file(&old.location);
        }

        log::info!(
            "Recording saved for story {} ({})",
            recording.story_id,
            recording.duration().as_elapsed()
        );
        Ok(recording)
    }

    /// Discards the capture in flight; no-op when idle
    pub fn cancel(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if let Err(e) = self.capture.cancel_capture(session.handle) {
            log::warn!("Discarding capture for {} failed: {}", session.story_id, e);
        }
        self.focus.release(FocusHolder::Recording);
        log::info!("Recording cancelled for story {}", session.story_id);
    }

    /// One second of recording; returns the new elapsed time
    pub fn tick(&mut self) -> Option<u64> {
        let session = self.session.as_mut()?;
        session.elapsed_secs += 1;
        Some(session.elapsed_secs)
    }

    /// Removes the saved recording for `story_id` and releases its file
    ///
    /// Returns whether there was one.
    pub fn delete(&mut self, story_id: &StoryId) -> NarrationResult<bool> {
        let Some(removed) = self.library.remove_recording(story_id)? else {
            log::debug!("No recording to delete for story {}", story_id);
            return Ok(false);
        };

        self.release_file(&removed.location);
        log::info!("Recording deleted for story {}", story_id);
        Ok(true)
    }

    /// Best effort; a file that is already gone is not an error
    fn release_file(&mut self, location: &Path) {
        match self.capture.release(location) {
            Ok(()) => log::debug!("Released {}", location.display()),
            Err(source) => {
                let benign = source.kind() == ErrorKind::NotFound;
                let err = NarrationError::ResourceRelease {
                    path: location.to_path_buf(),
                    source,
                };
                if benign {
                    log::warn!("{} (already gone)", err);
                } else {
                    log::warn!("{}", err);
                }
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> Option<RecordingStatus> {
        self.session.as_ref().map(|s| RecordingStatus {
            story_id: s.story_id.clone(),
            elapsed_secs: s.elapsed_secs,
        })
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        self.cancel();
    }
}
