// Microphone capture and clip playback on the host's default audio devices.
// cpal streams are not Send on every host, so each stream lives on its own
// thread and is driven through a crossbeam command channel.

use crate::capability::{
    AudioRecorder, CaptureHandle, ClipHandle, ClipPlayer, ClipTicket, EventSender,
    NarrationEvent, Permission,
};
use crate::error::{NarrationError, NarrationResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use fabletime_core::{StoryId, Timestamp};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const CAPTURE_POLL: Duration = Duration::from_millis(50);

fn recording_error(reason: impl ToString) -> NarrationError {
    NarrationError::capability("recording", reason.to_string())
}

fn playback_error(reason: impl ToString) -> NarrationError {
    NarrationError::capability("clip playback", reason.to_string())
}

// ===== Capture =====

struct ActiveCapture {
    handle: CaptureHandle,
    path: PathBuf,
    stop_tx: Sender<()>,
    thread: thread::JoinHandle<Result<(), String>>,
}

impl ActiveCapture {
    fn finish(self) -> Result<PathBuf, String> {
        let _ = self.stop_tx.send(());
        match self.thread.join() {
            Ok(Ok(())) => Ok(self.path),
            Ok(Err(e)) => Err(e),
            Err(_) => Err("capture thread panicked".to_string()),
        }
    }
}

/// Records the default input device to WAV files
pub struct DeviceRecorder {
    directory: PathBuf,
    next_handle: u64,
    active: Option<ActiveCapture>,
}

impl DeviceRecorder {
    /// Recordings are written under `directory`, created on first use
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            next_handle: 1,
            active: None,
        }
    }

    fn file_name(story_id: &StoryId) -> String {
        let safe: String = story_id
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("recording_{}_{}.wav", safe, Timestamp::now().as_millis())
    }

    fn take(&mut self, handle: CaptureHandle) -> NarrationResult<ActiveCapture> {
        match self.active.take() {
            Some(active) if active.handle == handle => Ok(active),
            other => {
                self.active = other;
                Err(recording_error(format!("unknown capture {:?}", handle)))
            }
        }
    }
}

impl AudioRecorder for DeviceRecorder {
    fn request_permission(&mut self) -> Permission {
        // desktop hosts do not prompt; a missing device fails in start_capture
        Permission::Granted
    }

    fn start_capture(&mut self, story_id: &StoryId) -> NarrationResult<CaptureHandle> {
        if self.active.is_some() {
            return Err(recording_error("a capture is already running"));
        }

        std::fs::create_dir_all(&self.directory).map_err(recording_error)?;
        let path = self.directory.join(Self::file_name(story_id));

        let (stop_tx, stop_rx) = bounded(1);
        let (ready_tx, ready_rx) = bounded(1);
        let thread_path = path.clone();
        let thread = thread::Builder::new()
            .name("fabletime-capture".to_string())
            .spawn(move || {
                let result = capture_loop(&thread_path, &stop_rx, &ready_tx);
                if let Err(e) = &result {
                    let _ = ready_tx.send(Err(e.clone()));
                }
                result
            })
            .map_err(recording_error)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(recording_error(e));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(recording_error("capture thread exited"));
            }
        }

        let handle = CaptureHandle(self.next_handle);
        self.next_handle += 1;
        log::debug!("Capturing to {}", path.display());
        self.active = Some(ActiveCapture {
            handle,
            path,
            stop_tx,
            thread,
        });
        Ok(handle)
    }

    fn stop_capture(&mut self, handle: CaptureHandle) -> NarrationResult<PathBuf> {
        let active = self.take(handle)?;
        let path = active.path.clone();
        active.finish().map_err(|e| {
            if let Err(remove) = std::fs::remove_file(&path) {
                if remove.kind() != ErrorKind::NotFound {
                    log::warn!("Could not remove partial capture {}: {}", path.display(), remove);
                }
            }
            recording_error(e)
        })
    }

    fn cancel_capture(&mut self, handle: CaptureHandle) -> NarrationResult<()> {
        let active = self.take(handle)?;
        let path = active.path.clone();
        if let Err(e) = active.finish() {
            log::warn!("Capture ended with an error while cancelling: {}", e);
        }
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(recording_error(e)),
        }
    }
}

impl Drop for DeviceRecorder {
    fn drop(&mut self) {
        if let Some(handle) = self.active.as_ref().map(|active| active.handle) {
            let _ = self.cancel_capture(handle);
        }
    }
}

fn capture_loop(
    path: &Path,
    stop_rx: &Receiver<()>,
    ready_tx: &Sender<Result<(), String>>,
) -> Result<(), String> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or("no input device")?;
    let config: StreamConfig = device
        .default_input_config()
        .map_err(|e| e.to_string())?
        .config();

    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate.0,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| e.to_string())?;

    let (sample_tx, sample_rx) = unbounded::<Vec<f32>>();
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = sample_tx.send(data.to_vec());
            },
            |err| log::error!("Audio input error: {}", err),
            None,
        )
        .map_err(|e| e.to_string())?;
    stream.play().map_err(|e| e.to_string())?;
    let _ = ready_tx.send(Ok(()));

    while matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
        match sample_rx.recv_timeout(CAPTURE_POLL) {
            Ok(chunk) => {
                for sample in chunk {
                    writer.write_sample(sample).map_err(|e| e.to_string())?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(stream);
    for chunk in sample_rx.try_iter() {
        for sample in chunk {
            writer.write_sample(sample).map_err(|e| e.to_string())?;
        }
    }
    writer.finalize().map_err(|e| e.to_string())
}

// ===== Playback =====

#[derive(Debug, Clone, Copy)]
enum ClipCommand {
    Pause,
    Seek(u64),
    Stop,
}

struct ActiveClip {
    handle: ClipHandle,
    commands: Sender<ClipCommand>,
    cursor: Arc<AtomicUsize>,
    sample_rate: u32,
    thread: Option<thread::JoinHandle<()>>,
}

impl ActiveClip {
    fn position_ms(&self) -> u64 {
        frames_to_ms(self.cursor.load(Ordering::Relaxed), self.sample_rate)
    }

    fn stop(&mut self) {
        let _ = self.commands.send(ClipCommand::Stop);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn frames_to_ms(frames: usize, sample_rate: u32) -> u64 {
    frames as u64 * 1000 / u64::from(sample_rate.max(1))
}

fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    (ms * u64::from(sample_rate) / 1000) as usize
}

/// Plays WAV recordings on the default output device
pub struct DeviceClipPlayer {
    events: EventSender,
    status_interval: Duration,
    next_handle: u64,
    active: Option<ActiveClip>,
}

impl DeviceClipPlayer {
    pub fn new(events: EventSender, status_interval: Duration) -> Self {
        Self {
            events,
            status_interval,
            next_handle: 1,
            active: None,
        }
    }

    fn active(&self, handle: ClipHandle) -> NarrationResult<&ActiveClip> {
        self.active
            .as_ref()
            .filter(|clip| clip.handle == handle)
            .ok_or_else(|| playback_error(format!("unknown clip {:?}", handle)))
    }
}

impl ClipPlayer for DeviceClipPlayer {
    fn load_and_play(
        &mut self,
        location: &Path,
        start_ms: u64,
        ticket: ClipTicket,
    ) -> NarrationResult<ClipHandle> {
        if let Some(mut previous) = self.active.take() {
            previous.stop();
        }

        let clip = DecodedClip::open(location).map_err(playback_error)?;
        let sample_rate = clip.sample_rate;
        let cursor = Arc::new(AtomicUsize::new(
            ms_to_frames(start_ms, sample_rate).min(clip.frames()),
        ));

        let (command_tx, command_rx) = bounded(8);
        let (ready_tx, ready_rx) = bounded(1);
        let events = self.events.clone();
        let interval = self.status_interval;
        let thread_cursor = Arc::clone(&cursor);
        let thread = thread::Builder::new()
            .name("fabletime-clip".to_string())
            .spawn(move || {
                let result = playback_loop(
                    clip,
                    ticket,
                    &command_rx,
                    &thread_cursor,
                    &events,
                    interval,
                    &ready_tx,
                );
                if let Err(e) = result {
                    if ready_tx.send(Err(e.clone())).is_err() {
                        let _ = events.send(NarrationEvent::ClipError { ticket, reason: e });
                    }
                }
            })
            .map_err(playback_error)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(playback_error(e));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(playback_error("playback thread exited"));
            }
        }

        let handle = ClipHandle(self.next_handle);
        self.next_handle += 1;
        self.active = Some(ActiveClip {
            handle,
            commands: command_tx,
            cursor,
            sample_rate,
            thread: Some(thread),
        });
        Ok(handle)
    }

    fn pause(&mut self, handle: ClipHandle) -> NarrationResult<u64> {
        let clip = self.active(handle)?;
        clip.commands
            .send(ClipCommand::Pause)
            .map_err(|_| playback_error("playback thread exited"))?;
        Ok(clip.position_ms())
    }

    fn seek(&mut self, handle: ClipHandle, position_ms: u64) -> NarrationResult<()> {
        self.active(handle)?
            .commands
            .send(ClipCommand::Seek(position_ms))
            .map_err(|_| playback_error("playback thread exited"))
    }

    fn unload(&mut self, handle: ClipHandle) {
        if self.active(handle).is_err() {
            return;
        }
        if let Some(mut clip) = self.active.take() {
            clip.stop();
        }
    }
}

impl Drop for DeviceClipPlayer {
    fn drop(&mut self) {
        if let Some(mut clip) = self.active.take() {
            clip.stop();
        }
    }
}

/// Interleaved samples of a whole WAV file
struct DecodedClip {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedClip {
    fn open(path: &Path) -> Result<Self, String> {
        let reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
        let spec = reader.spec();
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| e.to_string())?
            }
        };

        Ok(Self {
            samples,
            channels: spec.channels.max(1),
            sample_rate: spec.sample_rate,
        })
    }

    fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }
}

fn playback_loop(
    clip: DecodedClip,
    ticket: ClipTicket,
    commands: &Receiver<ClipCommand>,
    cursor: &Arc<AtomicUsize>,
    events: &EventSender,
    status_interval: Duration,
    ready_tx: &Sender<Result<(), String>>,
) -> Result<(), String> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or("no output device")?;
    let config = StreamConfig {
        channels: clip.channels,
        sample_rate: SampleRate(clip.sample_rate),
        buffer_size: BufferSize::Default,
    };

    let total_frames = clip.frames();
    let sample_rate = clip.sample_rate;
    let channels = usize::from(clip.channels);
    let samples = Arc::new(clip.samples);
    let paused = Arc::new(AtomicBool::new(false));

    let stream_samples = Arc::clone(&samples);
    let stream_cursor = Arc::clone(cursor);
    let stream_paused = Arc::clone(&paused);
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if stream_paused.load(Ordering::Relaxed) {
                    data.fill(0.0);
                    return;
                }
                let frame = stream_cursor.load(Ordering::Relaxed);
                let start = (frame * channels).min(stream_samples.len());
                let available = &stream_samples[start..];
                let copied = available.len().min(data.len());
                data[..copied].copy_from_slice(&available[..copied]);
                data[copied..].fill(0.0);
                stream_cursor.store(frame + copied / channels, Ordering::Relaxed);
            },
            |err| log::error!("Audio output error: {}", err),
            None,
        )
        .map_err(|e| e.to_string())?;
    stream.play().map_err(|e| e.to_string())?;
    let _ = ready_tx.send(Ok(()));

    loop {
        match commands.recv_timeout(status_interval) {
            Ok(ClipCommand::Pause) => paused.store(true, Ordering::Relaxed),
            Ok(ClipCommand::Seek(ms)) => {
                cursor.store(ms_to_frames(ms, sample_rate).min(total_frames), Ordering::Relaxed);
            }
            Ok(ClipCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if paused.load(Ordering::Relaxed) {
            continue;
        }

        let frame = cursor.load(Ordering::Relaxed);
        let position_ms = frames_to_ms(frame, sample_rate);
        if frame >= total_frames {
            let _ = events.send(NarrationEvent::clip_finished(ticket, position_ms));
            break;
        }
        if events
            .send(NarrationEvent::clip_position(ticket, position_ms))
            .is_err()
        {
            break;
        }
    }

    drop(stream);
    Ok(())
}
