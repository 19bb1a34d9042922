//! Concrete capability implementations
//!
//! - `paced`: terminal narrator that paces each unit by word count
//! - `unavailable`: stand-ins for builds without audio devices
//! - `device`: microphone capture and clip playback on the default devices
//!   (feature `device-audio`)

mod paced;
mod unavailable;

#[cfg(feature = "device-audio")]
mod device;

pub use paced::{speaking_time, PacedSpeech};
pub use unavailable::{UnavailableClipPlayer, UnavailableRecorder};

#[cfg(feature = "device-audio")]
pub use device::{DeviceClipPlayer, DeviceRecorder};
