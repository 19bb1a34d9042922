//! Narration preferences and saved recordings

use crate::types::{Duration, StoryId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which voice the listener prefers for narration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoicePreference {
    /// Synthesized speech
    #[default]
    Ai,
    /// The listener's own recording, when one exists for the story
    Custom,
}

impl fmt::Display for VoicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ai => write!(f, "ai"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for VoicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ai" => Ok(Self::Ai),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown voice preference '{}'", other)),
        }
    }
}

/// Gender of the synthesized voice, mapped to a speech pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

impl fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => write!(f, "female"),
            Self::Male => write!(f, "male"),
        }
    }
}

impl FromStr for VoiceGender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            other => Err(format!("unknown voice gender '{}'", other)),
        }
    }
}

/// What happens when a story finishes playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoPlayMode {
    #[default]
    Off,
    /// Next story in catalog order, wrapping around
    #[serde(alias = "continuous")]
    Sequential,
    /// A random story other than the current one
    Shuffle,
}

impl AutoPlayMode {
    /// Returns the next mode in the Off -> Sequential -> Shuffle cycle
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::Sequential,
            Self::Sequential => Self::Shuffle,
            Self::Shuffle => Self::Off,
        }
    }
}

impl fmt::Display for AutoPlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Sequential => write!(f, "sequential"),
            Self::Shuffle => write!(f, "shuffle"),
        }
    }
}

impl FromStr for AutoPlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "sequential" | "continuous" => Ok(Self::Sequential),
            "shuffle" => Ok(Self::Shuffle),
            other => Err(format!("unknown auto-play mode '{}'", other)),
        }
    }
}

/// Audio origin currently driving narration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackSource {
    #[default]
    Synthesized,
    Recorded,
}

impl PlaybackSource {
    /// Recorded only when the listener prefers their own voice and a
    /// recording exists for the story
    pub fn resolve(preference: VoicePreference, has_recording: bool) -> Self {
        match (preference, has_recording) {
            (VoicePreference::Custom, true) => Self::Recorded,
            _ => Self::Synthesized,
        }
    }
}

impl fmt::Display for PlaybackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synthesized => write!(f, "synthesized"),
            Self::Recorded => write!(f, "recorded"),
        }
    }
}

/// A narration captured by the listener, at most one per story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecording {
    pub story_id: StoryId,
    /// Durable location produced by the recording capability
    pub location: PathBuf,
    pub duration_secs: u64,
    pub created_at: Timestamp,
}

impl SavedRecording {
    /// Creates a recording stamped with the current time
    pub fn new(story_id: StoryId, location: PathBuf, duration_secs: u64) -> Self {
        Self {
            story_id,
            location,
            duration_secs,
            created_at: Timestamp::now(),
        }
    }

    /// Recording length as a [`Duration`]
    pub fn duration(&self) -> Duration {
        Duration::from_seconds(self.duration_secs)
    }
}
