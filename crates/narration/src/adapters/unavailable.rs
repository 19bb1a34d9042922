use crate::capability::{
    AudioRecorder, CaptureHandle, ClipHandle, ClipPlayer, ClipTicket, Permission,
};
use crate::error::{NarrationError, NarrationResult};
use fabletime_core::StoryId;
use std::path::{Path, PathBuf};

const NO_DEVICE: &str = "audio devices are not available in this build";

/// Clip player for builds without audio output; narration falls back to speech
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableClipPlayer;

impl ClipPlayer for UnavailableClipPlayer {
    fn load_and_play(
        &mut self,
        _location: &Path,
        _start_ms: u64,
        _ticket: ClipTicket,
    ) -> NarrationResult<ClipHandle> {
        Err(NarrationError::capability("clip playback", NO_DEVICE))
    }

    fn pause(&mut self, _handle: ClipHandle) -> NarrationResult<u64> {
        Err(NarrationError::capability("clip playback", NO_DEVICE))
    }

    fn seek(&mut self, _handle: ClipHandle, _position_ms: u64) -> NarrationResult<()> {
        Err(NarrationError::capability("clip playback", NO_DEVICE))
    }

    fn unload(&mut self, _handle: ClipHandle) {}
}

/// Recorder for builds without audio input
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRecorder;

impl AudioRecorder for UnavailableRecorder {
    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn start_capture(&mut self, _story_id: &StoryId) -> NarrationResult<CaptureHandle> {
        Err(NarrationError::capability("recording", NO_DEVICE))
    }

    fn stop_capture(&mut self, _handle: CaptureHandle) -> NarrationResult<PathBuf> {
        Err(NarrationError::capability("recording", NO_DEVICE))
    }

    fn cancel_capture(&mut self, _handle: CaptureHandle) -> NarrationResult<()> {
        Ok(())
    }
}
