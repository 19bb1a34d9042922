//! Domain types for Fabletime
//!
//! - `story`: Story and StoryId
//! - `narration`: voice preferences, auto-play mode and saved recordings
//! - `common`: Shared value types and the `Validator` trait

mod common;
mod narration;
mod story;

pub use common::{Duration, Timestamp, Validator};
pub use narration::{AutoPlayMode, PlaybackSource, SavedRecording, VoiceGender, VoicePreference};
pub use story::{Story, StoryId};
