//! Async narration runtime
//!
//! One tokio task owns the [`NarrationController`] and the [`VoiceRecorder`]
//! and is the only place either is mutated. Front ends talk to it through a
//! cloneable [`NarrationHandle`]; capability adapters feed it
//! [`NarrationEvent`]s; two [`PeriodicTask`]s drive the sleep timer and the
//! recording clock. After every command, event or tick the service
//! reconciles the tickers with the new state and publishes a snapshot.

use crate::capability::EventReceiver;
use crate::controller::{NarrationController, NarrationNotice, NarrationSnapshot, PlayOutcome};
use crate::error::{NarrationError, NarrationResult};
use crate::recorder::VoiceRecorder;
use crate::ticker::{PeriodicTask, Tick, TickKind};
use fabletime_core::{AutoPlayMode, SavedRecording, StoryId, VoiceGender, VoicePreference};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const TICK_PERIOD: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<NarrationResult<T>>;

/// Requests accepted by the service task
#[derive(Debug)]
pub enum NarrationCommand {
    Load(StoryId, Reply<()>),
    Play(Reply<PlayOutcome>),
    TogglePlay(Reply<PlayOutcome>),
    Pause(Reply<()>),
    Restart(Reply<PlayOutcome>),
    ToggleMute(Reply<bool>),
    SetAutoPlay(AutoPlayMode, Reply<()>),
    CycleAutoPlay(Reply<AutoPlayMode>),
    SetSleepTimer(u32, Reply<()>),
    SetVoicePreference(VoicePreference, Reply<()>),
    SetVoiceGender(VoiceGender, Reply<()>),
    StartRecording(StoryId, Reply<()>),
    StopRecording(Reply<SavedRecording>),
    CancelRecording(Reply<()>),
    DeleteRecording(StoryId, Reply<bool>),
    Shutdown(Reply<()>),
}

/// Cloneable client of a running [`NarrationService`]
///
/// The service shuts down once every handle is dropped.
#[derive(Clone)]
pub struct NarrationHandle {
    commands: mpsc::Sender<NarrationCommand>,
    snapshots: watch::Receiver<NarrationSnapshot>,
}

impl NarrationHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> NarrationCommand,
    ) -> NarrationResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| NarrationError::ServiceStopped)?;
        response.await.map_err(|_| NarrationError::ServiceStopped)?
    }

    pub async fn load(&self, story_id: StoryId) -> NarrationResult<()> {
        self.request(|reply| NarrationCommand::Load(story_id, reply))
            .await
    }

    pub async fn play(&self) -> NarrationResult<PlayOutcome> {
        self.request(NarrationCommand::Play).await
    }

    pub async fn toggle_play(&self) -> NarrationResult<PlayOutcome> {
        self.request(NarrationCommand::TogglePlay).await
    }

    pub async fn pause(&self) -> NarrationResult<()> {
        self.request(NarrationCommand::Pause).await
    }

    pub async fn restart(&self) -> NarrationResult<PlayOutcome> {
        self.request(NarrationCommand::Restart).await
    }

    pub async fn toggle_mute(&self) -> NarrationResult<bool> {
        self.request(NarrationCommand::ToggleMute).await
    }

    pub async fn set_auto_play(&self, mode: AutoPlayMode) -> NarrationResult<()> {
        self.request(|reply| NarrationCommand::SetAutoPlay(mode, reply))
            .await
    }

    pub async fn cycle_auto_play(&self) -> NarrationResult<AutoPlayMode> {
        self.request(NarrationCommand::CycleAutoPlay).await
    }

    pub async fn set_sleep_timer(&self, minutes: u32) -> NarrationResult<()> {
        self.request(|reply| NarrationCommand::SetSleepTimer(minutes, reply))
            .await
    }

    pub async fn set_voice_preference(&self, preference: VoicePreference) -> NarrationResult<()> {
        self.request(|reply| NarrationCommand::SetVoicePreference(preference, reply))
            .await
    }

    pub async fn set_voice_gender(&self, gender: VoiceGender) -> NarrationResult<()> {
        self.request(|reply| NarrationCommand::SetVoiceGender(gender, reply))
            .await
    }

    pub async fn start_recording(&self, story_id: StoryId) -> NarrationResult<()> {
        self.request(|reply| NarrationCommand::StartRecording(story_id, reply))
            .await
    }

    pub async fn stop_recording(&self) -> NarrationResult<SavedRecording> {
        self.request(NarrationCommand::StopRecording).await
    }

    pub async fn cancel_recording(&self) -> NarrationResult<()> {
        self.request(NarrationCommand::CancelRecording).await
    }

    pub async fn delete_recording(&self, story_id: StoryId) -> NarrationResult<bool> {
        self.request(|reply| NarrationCommand::DeleteRecording(story_id, reply))
            .await
    }

    /// Stops all audio and timers and ends the service task
    pub async fn shutdown(&self) -> NarrationResult<()> {
        self.request(NarrationCommand::Shutdown).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> NarrationSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NarrationSnapshot> {
        self.snapshots.clone()
    }
}

/// A spawned service and the channels that come out of it
pub struct SpawnedService {
    pub handle: NarrationHandle,
    pub notices: mpsc::UnboundedReceiver<NarrationNotice>,
    pub task: JoinHandle<()>,
}

pub struct NarrationService {
    controller: NarrationController,
    recorder: VoiceRecorder,
    commands: mpsc::Receiver<NarrationCommand>,
    events: EventReceiver,
    ticks_tx: mpsc::UnboundedSender<Tick>,
    ticks: mpsc::UnboundedReceiver<Tick>,
    sleep_ticker: PeriodicTask,
    recording_ticker: PeriodicTask,
    snapshots: watch::Sender<NarrationSnapshot>,
    notices: mpsc::UnboundedSender<NarrationNotice>,
}

impl NarrationService {
    /// Moves the controller and recorder onto a new tokio task
    ///
    /// `events` must be the receiving end of the channel the capability
    /// adapters were built with.
    pub fn spawn(
        controller: NarrationController,
        recorder: VoiceRecorder,
        events: EventReceiver,
    ) -> SpawnedService {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (ticks_tx, ticks) = mpsc::unbounded_channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();

        let mut initial = controller.snapshot();
        initial.recording = recorder.status();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let service = Self {
            controller,
            recorder,
            commands,
            events,
            ticks_tx,
            ticks,
            sleep_ticker: PeriodicTask::new(TickKind::SleepTimer, TICK_PERIOD),
            recording_ticker: PeriodicTask::new(TickKind::RecordingElapsed, TICK_PERIOD),
            snapshots: snapshot_tx,
            notices: notice_tx,
        };
        let task = tokio::spawn(service.run());

        SpawnedService {
            handle: NarrationHandle {
                commands: command_tx,
                snapshots: snapshot_rx,
            },
            notices,
            task,
        }
    }

    async fn run(mut self) {
        log::info!("Narration service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(NarrationCommand::Shutdown(reply)) => {
                        self.teardown();
                        let _ = reply.send(Ok(()));
                        return;
                    }
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events.recv() => self.controller.handle_event(event),
                Some(tick) = self.ticks.recv() => self.handle_tick(tick),
            }
            self.settle();
        }

        self.teardown();
    }

    fn handle_command(&mut self, command: NarrationCommand) {
        match command {
            NarrationCommand::Load(story_id, reply) => {
                let _ = reply.send(self.controller.load_by_id(&story_id));
            }
            NarrationCommand::Play(reply) => {
                let _ = reply.send(self.controller.play());
            }
            NarrationCommand::TogglePlay(reply) => {
                let _ = reply.send(self.controller.toggle_play());
            }
            NarrationCommand::Pause(reply) => {
                self.controller.pause();
                let _ = reply.send(Ok(()));
            }
            NarrationCommand::Restart(reply) => {
                let _ = reply.send(self.controller.restart());
            }
            NarrationCommand::ToggleMute(reply) => {
                let _ = reply.send(Ok(self.controller.toggle_mute()));
            }
            NarrationCommand::SetAutoPlay(mode, reply) => {
                self.controller.set_auto_play(mode);
                let _ = reply.send(Ok(()));
            }
            NarrationCommand::CycleAutoPlay(reply) => {
                let _ = reply.send(Ok(self.controller.cycle_auto_play()));
            }
            NarrationCommand::SetSleepTimer(minutes, reply) => {
                self.controller.set_sleep_timer(minutes);
                let _ = reply.send(Ok(()));
            }
            NarrationCommand::SetVoicePreference(preference, reply) => {
                let result = self
                    .controller
                    .library()
                    .set_voice_preference(preference)
                    .map_err(NarrationError::from);
                if result.is_ok() {
                    self.controller.refresh_source();
                }
                let _ = reply.send(result);
            }
            NarrationCommand::SetVoiceGender(gender, reply) => {
                let result = self
                    .controller
                    .library()
                    .set_voice_gender(gender)
                    .map_err(NarrationError::from);
                let _ = reply.send(result);
            }
            NarrationCommand::StartRecording(story_id, reply) => {
                let _ = reply.send(self.recorder.start(&story_id));
            }
            NarrationCommand::StopRecording(reply) => {
                let result = self.recorder.stop();
                if let Ok(recording) = &result {
                    self.controller.on_recordings_changed(&recording.story_id);
                }
                let _ = reply.send(result);
            }
            NarrationCommand::CancelRecording(reply) => {
                self.recorder.cancel();
                let _ = reply.send(Ok(()));
            }
            NarrationCommand::DeleteRecording(story_id, reply) => {
                // stop a clip of this story before its file goes away
                self.controller.on_recordings_changed(&story_id);
                let result = self.recorder.delete(&story_id);
                self.controller.refresh_source();
                let _ = reply.send(result);
            }
            NarrationCommand::Shutdown(reply) => {
                self.teardown();
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn handle_tick(&mut self, tick: Tick) {
        match tick.kind {
            TickKind::SleepTimer if self.sleep_ticker.accepts(&tick) => {
                self.controller.tick_sleep_timer();
            }
            TickKind::RecordingElapsed if self.recording_ticker.accepts(&tick) => {
                self.recorder.tick();
            }
            _ => log::debug!("Dropping stale tick {:?}", tick),
        }
    }

    /// Aligns tickers with state, then publishes notices and the snapshot
    fn settle(&mut self) {
        self.sleep_ticker
            .reconcile(self.controller.sleep_timer().is_running(), &self.ticks_tx);
        self.recording_ticker
            .reconcile(self.recorder.is_recording(), &self.ticks_tx);

        for notice in self.controller.drain_notices() {
            let _ = self.notices.send(notice);
        }

        let mut snapshot = self.controller.snapshot();
        snapshot.recording = self.recorder.status();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn teardown(&mut self) {
        self.controller.shutdown();
        self.recorder.cancel();
        self.sleep_ticker.stop();
        self.recording_ticker.stop();
        self.settle();
        log::info!("Narration service stopped");
    }
}
