//! Narration configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use fabletime_core::{AutoPlayMode, VoiceGender};
use serde::{Deserialize, Serialize};

/// Speech synthesis, auto-play and sleep timer preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NarrationConfig {
    /// BCP-47 language tag passed to the speech engine
    pub language: String,

    /// Speech rate multiplier (0.25 - 2.0)
    pub speech_rate: f32,

    /// Pitch used for the female voice
    pub female_pitch: f32,

    /// Pitch used for the male voice
    pub male_pitch: f32,

    /// Pace of the terminal narrator at rate 1.0
    pub words_per_minute: u32,

    /// Auto-play mode a new player starts with
    pub default_auto_play: AutoPlayMode,

    /// Sleep timer menu in minutes; 0 means off
    pub sleep_timer_options: Vec<u32>,

    /// How often recorded-clip playback reports its position
    pub clip_status_interval_ms: u64,
}

impl NarrationConfig {
    /// Pitch for the selected AI voice
    pub fn pitch_for(&self, gender: VoiceGender) -> f32 {
        match gender {
            VoiceGender::Female => self.female_pitch,
            VoiceGender::Male => self.male_pitch,
        }
    }

    /// Menu entry after `current`, wrapping back to off
    pub fn next_sleep_option(&self, current: u32) -> u32 {
        self.sleep_timer_options
            .iter()
            .copied()
            .find(|&minutes| minutes > current)
            .unwrap_or(0)
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            speech_rate: 0.85,
            female_pitch: 1.15,
            male_pitch: 0.25,
            words_per_minute: 160,
            default_auto_play: AutoPlayMode::Off,
            sleep_timer_options: vec![0, 5, 10, 15, 30, 45, 60],
            clip_status_interval_ms: 250,
        }
    }
}

impl ConfigSection for NarrationConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::not_empty(&self.language, "narration.language"),
            Validator::in_range(self.speech_rate, 0.25, 2.0, "narration.speech_rate"),
            Validator::in_range(self.female_pitch, 0.1, 2.0, "narration.female_pitch"),
            Validator::in_range(self.male_pitch, 0.1, 2.0, "narration.male_pitch"),
            Validator::in_range(self.words_per_minute, 60, 400, "narration.words_per_minute"),
            Validator::menu_starting_at_zero(
                &self.sleep_timer_options,
                "narration.sleep_timer_options",
            ),
            Validator::in_range(
                self.clip_status_interval_ms,
                50,
                2000,
                "narration.clip_status_interval_ms",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.language = other.language;
        self.speech_rate = other.speech_rate;
        self.female_pitch = other.female_pitch;
        self.male_pitch = other.male_pitch;
        self.words_per_minute = other.words_per_minute;
        self.default_auto_play = other.default_auto_play;
        self.sleep_timer_options = other.sleep_timer_options;
        self.clip_status_interval_ms = other.clip_status_interval_ms;
    }

    fn section_name(&self) -> &'static str {
        "narration"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(NarrationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_pitch_for_gender() {
        let config = NarrationConfig::default();
        assert_eq!(config.pitch_for(VoiceGender::Female), 1.15);
        assert_eq!(config.pitch_for(VoiceGender::Male), 0.25);
    }

    #[test]
    fn test_next_sleep_option_wraps() {
        let config = NarrationConfig::default();
        assert_eq!(config.next_sleep_option(0), 5);
        assert_eq!(config.next_sleep_option(30), 45);
        assert_eq!(config.next_sleep_option(60), 0);
        assert_eq!(config.next_sleep_option(7), 10);
    }

    #[test]
    fn test_sleep_menu_must_start_with_off() {
        let config = NarrationConfig {
            sleep_timer_options: vec![5, 10],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sleep_menu_must_be_ascending() {
        let config = NarrationConfig {
            sleep_timer_options: vec![0, 10, 5],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = NarrationConfig {
            language: " ".to_string(),
            speech_rate: 3.0,
            words_per_minute: 10,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 3);
    }
}
