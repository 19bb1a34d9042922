//! Exclusive audio focus shared by narration and recording

use crate::error::{NarrationError, NarrationResult};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Which session currently drives the audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusHolder {
    Narration,
    Recording,
}

impl fmt::Display for FocusHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narration => write!(f, "narration playback"),
            Self::Recording => write!(f, "voice recording"),
        }
    }
}

/// Cloneable handle to the single audio focus slot
#[derive(Debug, Clone, Default)]
pub struct AudioFocus {
    holder: Arc<Mutex<Option<FocusHolder>>>,
}

impl AudioFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes focus for `who`; re-acquiring by the current holder succeeds
    pub fn acquire(&self, who: FocusHolder) -> NarrationResult<()> {
        let mut holder = self.slot();
        match *holder {
            Some(current) if current != who => Err(NarrationError::AlreadyActive { holder: current }),
            _ => {
                *holder = Some(who);
                Ok(())
            }
        }
    }

    /// Gives focus back if `who` holds it
    pub fn release(&self, who: FocusHolder) {
        let mut holder = self.slot();
        if *holder == Some(who) {
            *holder = None;
        }
    }

    pub fn holder(&self) -> Option<FocusHolder> {
        *self.slot()
    }

    fn slot(&self) -> MutexGuard<'_, Option<FocusHolder>> {
        // the slot holds a plain value, so a poisoned lock is still consistent
        self.holder.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
