//! Sleep timer countdown
//!
//! Pure state; the owner feeds it one [`SleepTimer::tick`] per second and
//! tells it when playback starts or stops.

use fabletime_core::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepTimerState {
    #[default]
    Disabled,
    Armed,
    Running,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepTick {
    /// Not running, nothing changed
    Idle,
    /// Seconds left after this tick
    Counting(u32),
    /// Reached zero on this tick; the timer is now disabled
    Expired,
}

#[derive(Debug, Clone, Default)]
pub struct SleepTimer {
    remaining_secs: u32,
    running: bool,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the countdown to `minutes`; 0 disables it
    ///
    /// Counting starts right away when narration is already playing.
    pub fn arm(&mut self, minutes: u32, is_playing: bool) {
        self.remaining_secs = minutes.saturating_mul(60);
        self.running = is_playing && self.remaining_secs > 0;
        log::debug!("Sleep timer set to {} minutes", minutes);
    }

    pub fn disable(&mut self) {
        self.remaining_secs = 0;
        self.running = false;
    }

    /// Counts only while narration plays; stopping pauses without resetting
    pub fn on_playback_changed(&mut self, is_playing: bool) {
        self.running = is_playing && self.remaining_secs > 0;
    }

    pub fn tick(&mut self) -> SleepTick {
        if !self.running {
            return SleepTick::Idle;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            log::info!("Sleep timer expired");
            SleepTick::Expired
        } else {
            SleepTick::Counting(self.remaining_secs)
        }
    }

    pub fn state(&self) -> SleepTimerState {
        match (self.remaining_secs, self.running) {
            (0, _) => SleepTimerState::Disabled,
            (_, false) => SleepTimerState::Armed,
            (_, true) => SleepTimerState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_seconds(u64::from(self.remaining_secs))
    }
}
