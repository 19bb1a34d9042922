//! Narration Engine - story narration and voice recording for Fabletime

pub mod adapters;
mod auto_advance;
mod capability;
mod controller;
mod error;
mod focus;
mod recorder;
mod segmenter;
mod service;
mod sleep_timer;
mod ticker;

pub use auto_advance::AutoAdvance;
pub use capability::{
    event_channel, AudioRecorder, CaptureHandle, ClipHandle, ClipPlayer, ClipTicket,
    EventReceiver, EventSender, NarrationEvent, Permission, SpeechOptions, SpeechOutcome,
    SpeechSynthesizer, UtteranceTicket,
};
pub use controller::{
    NarrationController, NarrationNotice, NarrationSnapshot, PlayOutcome, SpeechSettings,
};
pub use error::{NarrationError, NarrationResult};
pub use focus::{AudioFocus, FocusHolder};
pub use recorder::{RecordingStatus, VoiceRecorder};
pub use segmenter::segment;
pub use service::{NarrationCommand, NarrationHandle, NarrationService, SpawnedService};
pub use sleep_timer::{SleepTick, SleepTimer, SleepTimerState};
pub use ticker::{PeriodicTask, Tick, TickKind};
