pub mod catalog;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use catalog::{Catalog, StaticCatalog, ALL_CATEGORIES};
pub use error::{AppError, RecoveryAction, Result};
pub use types::{
    AutoPlayMode, Duration, PlaybackSource, SavedRecording, Story, StoryId, Timestamp,
    Validator, VoiceGender, VoicePreference,
};
