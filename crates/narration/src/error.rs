// FILE: crates/narration/src/error.rs

use crate::focus::FocusHolder;
use fabletime_core::StoryId;
use fabletime_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("Audio is busy with {holder}")]
    AlreadyActive { holder: FocusHolder },

    #[error("{capability} failed: {reason}")]
    Capability {
        capability: &'static str,
        reason: String,
    },

    #[error("No saved recording for story {story_id}")]
    MissingRecording { story_id: StoryId },

    #[error("Could not release {path}: {source}")]
    ResourceRelease {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No recording in progress")]
    NotRecording,

    #[error("Story not found: {story_id}")]
    StoryNotFound { story_id: StoryId },

    #[error("User library error: {0}")]
    Store(#[from] StoreError),

    #[error("Narration service has stopped")]
    ServiceStopped,
}

pub type NarrationResult<T> = Result<T, NarrationError>;

impl NarrationError {
    pub fn capability(capability: &'static str, reason: impl Into<String>) -> Self {
        Self::Capability {
            capability,
            reason: reason.into(),
        }
    }

    /// Errors the session absorbs by stopping or falling back
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Capability { .. } | Self::MissingRecording { .. } | Self::ResourceRelease { .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Please allow microphone access to record your voice.".to_string()
            }
            Self::AlreadyActive { holder } => {
                format!("Finish {} before starting something new.", holder)
            }
            Self::Capability { .. } => "Playback stopped because of an audio problem.".to_string(),
            Self::MissingRecording { .. } => {
                "Your recording is missing, using the AI voice instead.".to_string()
            }
            Self::ResourceRelease { .. } => "An old recording file was already gone.".to_string(),
            Self::NotRecording => "There is no recording in progress.".to_string(),
            Self::StoryNotFound { .. } => "That story could not be found.".to_string(),
            Self::Store(_) => "Your recording could not be saved. Please try again.".to_string(),
            Self::ServiceStopped => "The player has closed.".to_string(),
        }
    }
}
