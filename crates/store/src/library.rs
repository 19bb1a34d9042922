//! User library: favorites, voice settings and the recordings index

use crate::error::{StoreError, StoreResult};
use crate::kv::KeyValueStore;
use fabletime_core::{SavedRecording, StoryId, VoiceGender, VoicePreference};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

pub const FAVORITES_KEY: &str = "fairy_tale_favorites";
pub const VOICE_PREFERENCE_KEY: &str = "voice_preference";
pub const VOICE_GENDER_KEY: &str = "ai_voice_gender";
pub const RECORDINGS_KEY: &str = "story_voice_recordings";

/// Typed view over a [`KeyValueStore`]
///
/// Lists and maps are stored as JSON, the two voice settings as their plain
/// lowercase names. Reads never fail: a value that cannot be read or decoded
/// is logged and treated as absent.
pub struct UserLibrary {
    store: Arc<dyn KeyValueStore>,
}

impl UserLibrary {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // ===== Favorites =====

    /// Favorite story ids in the order they were added
    pub fn favorites(&self) -> Vec<StoryId> {
        self.read_json(FAVORITES_KEY).unwrap_or_default()
    }

    pub fn is_favorite(&self, id: &StoryId) -> bool {
        self.favorites().contains(id)
    }

    /// Adds or removes `id`, returning whether it is now a favorite
    pub fn toggle_favorite(&self, id: &StoryId) -> StoreResult<bool> {
        let mut favorites = self.favorites();
        let now_favorite = match favorites.iter().position(|f| f == id) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(id.clone());
                true
            }
        };

        self.write_json(FAVORITES_KEY, &favorites)?;
        log::debug!(
            "Story {} {} favorites",
            id,
            if now_favorite { "added to" } else { "removed from" }
        );
        Ok(now_favorite)
    }

    // ===== Voice settings =====

    pub fn voice_preference(&self) -> VoicePreference {
        self.read_parsed(VOICE_PREFERENCE_KEY).unwrap_or_default()
    }

    pub fn set_voice_preference(&self, preference: VoicePreference) -> StoreResult<()> {
        self.store
            .set(VOICE_PREFERENCE_KEY, &preference.to_string())?;
        log::info!("Voice preference saved: {}", preference);
        Ok(())
    }

    pub fn voice_gender(&self) -> VoiceGender {
        self.read_parsed(VOICE_GENDER_KEY).unwrap_or_default()
    }

    pub fn set_voice_gender(&self, gender: VoiceGender) -> StoreResult<()> {
        self.store.set(VOICE_GENDER_KEY, &gender.to_string())?;
        log::info!("AI voice gender saved: {}", gender);
        Ok(())
    }

    // ===== Recordings =====

    pub fn recording(&self, id: &StoryId) -> Option<SavedRecording> {
        self.recordings_map().remove(id.as_str())
    }

    pub fn has_recording(&self, id: &StoryId) -> bool {
        self.recordings_map().contains_key(id.as_str())
    }

    /// Every saved recording, ordered by story id
    pub fn recordings(&self) -> Vec<SavedRecording> {
        self.recordings_map().into_values().collect()
    }

    /// Stores `recording`, returning the entry it replaced
    ///
    /// The caller owns releasing the replaced entry's file.
    pub fn save_recording(&self, recording: SavedRecording) -> StoreResult<Option<SavedRecording>> {
        let mut map = self.recordings_map();
        let story_id = recording.story_id.clone();
        let previous = map.insert(story_id.as_str().to_string(), recording);

        self.write_json(RECORDINGS_KEY, &map)?;
        log::info!(
            "Saved recording for story {} ({} total)",
            story_id,
            map.len()
        );
        Ok(previous)
    }

    /// Removes the index entry for `id`, returning it if there was one
    pub fn remove_recording(&self, id: &StoryId) -> StoreResult<Option<SavedRecording>> {
        let mut map = self.recordings_map();
        let Some(removed) = map.remove(id.as_str()) else {
            return Ok(None);
        };

        self.write_json(RECORDINGS_KEY, &map)?;
        log::info!("Removed recording for story {}", id);
        Ok(Some(removed))
    }

    fn recordings_map(&self) -> BTreeMap<String, SavedRecording> {
        self.read_json(RECORDINGS_KEY).unwrap_or_default()
    }

    // ===== Encoding =====

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Could not read '{}' from user library: {}", key, e);
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring corrupt value for '{}': {}", key, e);
                None
            }
        }
    }

    fn read_parsed<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.read_raw(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring corrupt value for '{}': {}", key, e);
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            source: e,
        })?;
        self.store.set(key, &json)
    }
}
