//! Capability interfaces the narration core drives
//!
//! Capabilities are called synchronously and report completion later as a
//! [`NarrationEvent`] on the channel they were built with. Every request
//! carries a ticket naming the generation that issued it; the controller
//! drops events whose ticket is no longer current.

use crate::error::NarrationResult;
use fabletime_core::StoryId;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Voice parameters for one spoken unit
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub pitch: f32,
    pub rate: f32,
    pub language: String,
}

/// Identifies one speak request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceTicket {
    pub generation: u64,
    pub unit: usize,
}

/// Identifies one clip load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipTicket {
    pub generation: u64,
}

/// A loaded clip inside a [`ClipPlayer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipHandle(pub u64);

/// An in-progress capture inside an [`AudioRecorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// How a spoken unit ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Done,
    Stopped,
    Error(String),
}

/// Callback traffic from capabilities back to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    Speech {
        ticket: UtteranceTicket,
        outcome: SpeechOutcome,
    },
    ClipStatus {
        ticket: ClipTicket,
        position_ms: u64,
        did_finish: bool,
    },
    ClipError {
        ticket: ClipTicket,
        reason: String,
    },
}

impl NarrationEvent {
    pub fn speech_done(ticket: UtteranceTicket) -> Self {
        Self::Speech {
            ticket,
            outcome: SpeechOutcome::Done,
        }
    }

    pub fn speech_stopped(ticket: UtteranceTicket) -> Self {
        Self::Speech {
            ticket,
            outcome: SpeechOutcome::Stopped,
        }
    }

    pub fn speech_error(ticket: UtteranceTicket, reason: impl Into<String>) -> Self {
        Self::Speech {
            ticket,
            outcome: SpeechOutcome::Error(reason.into()),
        }
    }

    pub fn clip_position(ticket: ClipTicket, position_ms: u64) -> Self {
        Self::ClipStatus {
            ticket,
            position_ms,
            did_finish: false,
        }
    }

    pub fn clip_finished(ticket: ClipTicket, position_ms: u64) -> Self {
        Self::ClipStatus {
            ticket,
            position_ms,
            did_finish: true,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<NarrationEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<NarrationEvent>;

/// Channel capabilities report on
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Text-to-speech engine
///
/// At most one unit is in flight; the controller only requests the next unit
/// after the previous one reported [`SpeechOutcome::Done`].
pub trait SpeechSynthesizer: Send {
    fn speak(
        &mut self,
        text: &str,
        options: &SpeechOptions,
        ticket: UtteranceTicket,
    ) -> NarrationResult<()>;

    /// Stops speaking now; a late callback for the stopped unit may still arrive
    fn stop_all(&mut self);
}

/// Playback side of the recording capability
pub trait ClipPlayer: Send {
    /// Loads `location` and starts playing from `start_ms`
    fn load_and_play(
        &mut self,
        location: &Path,
        start_ms: u64,
        ticket: ClipTicket,
    ) -> NarrationResult<ClipHandle>;

    /// Pauses and returns the current position
    fn pause(&mut self, handle: ClipHandle) -> NarrationResult<u64>;

    fn seek(&mut self, handle: ClipHandle, position_ms: u64) -> NarrationResult<()>;

    fn unload(&mut self, handle: ClipHandle);
}

/// Capture side of the recording capability
pub trait AudioRecorder: Send {
    fn request_permission(&mut self) -> Permission;

    fn start_capture(&mut self, story_id: &StoryId) -> NarrationResult<CaptureHandle>;

    /// Finalizes the capture and returns its durable location
    fn stop_capture(&mut self, handle: CaptureHandle) -> NarrationResult<PathBuf>;

    /// Discards the capture and any partial file
    fn cancel_capture(&mut self, handle: CaptureHandle) -> NarrationResult<()>;

    /// Releases a durable recording file
    fn release(&mut self, location: &Path) -> std::io::Result<()> {
        std::fs::remove_file(location)
    }
}
