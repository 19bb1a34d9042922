use crate::commands::required_id;
use crate::context::AppContext;
use anyhow::{Context, Result};
use clap::ArgMatches;
use console::{style, Key, Term};
use fabletime_core::{AutoPlayMode, Duration as CoreDuration, VoicePreference};
use narration_engine::adapters::PacedSpeech;
use narration_engine::{
    event_channel, AudioFocus, AudioRecorder, AutoAdvance, ClipPlayer, EventSender,
    NarrationController, NarrationError, NarrationHandle, NarrationNotice, NarrationService,
    NarrationSnapshot, PlayOutcome, SleepTimerState, SpawnedService, SpeechSettings,
    VoiceRecorder,
};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerAction {
    TogglePlay,
    Restart,
    ToggleMute,
    CycleAutoPlay,
    CycleSleepTimer,
    Quit,
}

fn player_action(key: &Key) -> Option<PlayerAction> {
    match key {
        Key::Char(' ') => Some(PlayerAction::TogglePlay),
        Key::Char('r') | Key::Char('R') => Some(PlayerAction::Restart),
        Key::Char('m') | Key::Char('M') => Some(PlayerAction::ToggleMute),
        Key::Char('a') | Key::Char('A') => Some(PlayerAction::CycleAutoPlay),
        Key::Char('t') | Key::Char('T') => Some(PlayerAction::CycleSleepTimer),
        Key::Char('q') | Key::Char('Q') | Key::Escape => Some(PlayerAction::Quit),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderAction {
    Save,
    Discard,
}

fn recorder_action(key: &Key) -> Option<RecorderAction> {
    match key {
        Key::Enter | Key::Char('s') | Key::Char('S') => Some(RecorderAction::Save),
        Key::Escape | Key::Char('c') | Key::Char('C') | Key::Char('q') => {
            Some(RecorderAction::Discard)
        }
        _ => None,
    }
}

/// Narrate a story with single-key controls
pub async fn play_story(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let story = ctx.story(required_id(matches)?)?.clone();

    let auto_play = match matches.get_one::<String>("auto") {
        Some(mode) => mode.parse::<AutoPlayMode>().map_err(|e| anyhow::anyhow!(e))?,
        None => ctx.config.narration.default_auto_play,
    };
    let seed = matches.get_one::<u64>("seed").copied();
    let mut sleep_minutes = matches.get_one::<u32>("sleep").copied().unwrap_or(0);

    let SpawnedService {
        handle,
        mut notices,
        task,
    } = spawn_service(ctx, auto_play, seed);

    let mut snapshots = handle.subscribe();
    handle
        .load(story.id.clone())
        .await
        .context("Failed to load story")?;
    if sleep_minutes > 0 {
        handle.set_sleep_timer(sleep_minutes).await?;
    }

    let term = Term::stdout();
    print_controls(&term)?;

    if let PlayOutcome::Ignored = handle.play().await.context("Failed to start narration")? {
        println!("Nothing to narrate in '{}'", story.title);
    }

    let mut keys = spawn_key_reader(term.clone())?;
    let mut keys_open = true;

    loop {
        tokio::select! {
            key = keys.recv(), if keys_open => match key {
                Some(key) => {
                    let Some(action) = player_action(&key) else { continue };
                    if action == PlayerAction::Quit {
                        break;
                    }
                    if let Err(e) = apply_action(ctx, &handle, action, &mut sleep_minutes).await {
                        print_error(&e);
                    }
                    print_status(&term, &handle.snapshot())?;
                }
                None => {
                    log::debug!("Keyboard closed; narrating until the story ends");
                    keys_open = false;
                    if !handle.snapshot().is_playing {
                        break;
                    }
                }
            },
            Some(notice) = notices.recv() => {
                if notice == NarrationNotice::SleepTimerExpired {
                    sleep_minutes = 0;
                }
                print_notice(&term, &notice)?;
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let stopped = !snapshots.borrow_and_update().is_playing;
                if stopped && !keys_open {
                    break;
                }
            }
        }
    }

    handle.shutdown().await?;
    task.await.context("Narration service panicked")?;
    println!("\n{}", style("Good night!").dim());

    Ok(())
}

/// Record your own narration of a story; Enter saves, Esc discards
pub async fn record_story(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let story = ctx.story(required_id(matches)?)?.clone();

    let SpawnedService { handle, task, .. } = spawn_service(ctx, AutoPlayMode::Off, None);

    if let Err(e) = handle.start_recording(story.id.clone()).await {
        handle.shutdown().await?;
        return Err(anyhow::Error::new(e).context("Could not start recording"));
    }

    let term = Term::stdout();
    term.write_line(&format!(
        "\n{} Recording '{}'",
        style("●").red().bold(),
        style(&story.title).bold()
    ))?;
    term.write_line("  Read the story aloud. Enter saves, Esc discards.\n")?;

    let mut keys = spawn_key_reader(term.clone())?;
    let mut snapshots = handle.subscribe();

    let action = loop {
        tokio::select! {
            key = keys.recv() => match key {
                Some(key) => {
                    if let Some(action) = recorder_action(&key) {
                        break action;
                    }
                }
                None => {
                    handle.cancel_recording().await?;
                    handle.shutdown().await?;
                    anyhow::bail!("Recording needs an interactive terminal");
                }
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    anyhow::bail!("The recorder stopped unexpectedly");
                }
                let elapsed = snapshots
                    .borrow_and_update()
                    .recording
                    .as_ref()
                    .map(|status| status.elapsed().as_elapsed());
                if let Some(elapsed) = elapsed {
                    term.clear_line()?;
                    term.write_str(&format!("  {} {}", style("●").red(), elapsed))?;
                }
            }
        }
    };
    term.write_line("")?;

    match action {
        RecorderAction::Save => {
            let saved = handle
                .stop_recording()
                .await
                .context("Failed to save recording")?;
            println!(
                "{} Saved {} of '{}' to {}",
                style("✓").green().bold(),
                saved.duration().as_elapsed(),
                story.title,
                saved.location.display()
            );
            if ctx.library.voice_preference() == VoicePreference::Ai {
                println!("  Use 'fabletime voice --use custom' to hear it during playback.");
            }
        }
        RecorderAction::Discard => {
            handle.cancel_recording().await?;
            println!("Recording discarded");
        }
    }

    handle.shutdown().await?;
    task.await.context("Narration service panicked")?;
    Ok(())
}

async fn apply_action(
    ctx: &AppContext,
    handle: &NarrationHandle,
    action: PlayerAction,
    sleep_minutes: &mut u32,
) -> Result<(), NarrationError> {
    match action {
        PlayerAction::TogglePlay => {
            if let PlayOutcome::FellBackToSpeech(e) = handle.toggle_play().await? {
                log::debug!("Toggle fell back to speech: {}", e);
            }
        }
        PlayerAction::Restart => {
            handle.restart().await?;
        }
        PlayerAction::ToggleMute => {
            handle.toggle_mute().await?;
        }
        PlayerAction::CycleAutoPlay => {
            handle.cycle_auto_play().await?;
        }
        PlayerAction::CycleSleepTimer => {
            *sleep_minutes = ctx.config.narration.next_sleep_option(*sleep_minutes);
            handle.set_sleep_timer(*sleep_minutes).await?;
        }
        PlayerAction::Quit => {}
    }
    Ok(())
}

fn spawn_service(ctx: &AppContext, auto_play: AutoPlayMode, seed: Option<u64>) -> SpawnedService {
    let (events_tx, events) = event_channel();
    let focus = AudioFocus::new();

    let speech = PacedSpeech::new(events_tx.clone(), ctx.config.narration.words_per_minute)
        .with_hook(|text, _options| println!("  {} {}", style("»").cyan(), text));

    let auto_advance = match seed {
        Some(seed) => AutoAdvance::seeded(seed),
        None => AutoAdvance::from_entropy(),
    };

    let controller = NarrationController::new(
        Box::new(speech),
        clip_capability(ctx, events_tx),
        Arc::clone(&ctx.library),
        ctx.catalog.clone(),
        focus.clone(),
    )
    .with_settings(SpeechSettings::from_config(&ctx.config.narration))
    .with_auto_advance(auto_advance)
    .with_auto_play(auto_play);

    let recorder = VoiceRecorder::new(recorder_capability(ctx), Arc::clone(&ctx.library), focus);

    NarrationService::spawn(controller, recorder, events)
}

#[cfg(feature = "device-audio")]
fn clip_capability(ctx: &AppContext, events: EventSender) -> Box<dyn ClipPlayer> {
    Box::new(narration_engine::adapters::DeviceClipPlayer::new(
        events,
        std::time::Duration::from_millis(ctx.config.narration.clip_status_interval_ms),
    ))
}

#[cfg(not(feature = "device-audio"))]
fn clip_capability(_ctx: &AppContext, _events: EventSender) -> Box<dyn ClipPlayer> {
    Box::new(narration_engine::adapters::UnavailableClipPlayer)
}

#[cfg(feature = "device-audio")]
pub(crate) fn recorder_capability(ctx: &AppContext) -> Box<dyn AudioRecorder> {
    Box::new(narration_engine::adapters::DeviceRecorder::new(
        ctx.recordings_dir(),
    ))
}

#[cfg(not(feature = "device-audio"))]
pub(crate) fn recorder_capability(_ctx: &AppContext) -> Box<dyn AudioRecorder> {
    Box::new(narration_engine::adapters::UnavailableRecorder)
}

/// Forwards key presses from a blocking reader thread
fn spawn_key_reader(term: Term) -> Result<mpsc::UnboundedReceiver<Key>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("fabletime-keys".to_string())
        .spawn(move || {
            while let Ok(key) = term.read_key() {
                if tx.send(key).is_err() {
                    break;
                }
            }
        })
        .context("Failed to start the keyboard reader")?;
    Ok(rx)
}

fn status_line(snapshot: &NarrationSnapshot) -> String {
    let state = if snapshot.is_muted {
        "Muted"
    } else if snapshot.is_playing {
        "Playing"
    } else {
        "Paused"
    };

    let sleep = match snapshot.sleep_timer {
        SleepTimerState::Disabled => "off".to_string(),
        SleepTimerState::Armed => format!(
            "{} (waiting)",
            CoreDuration::from_seconds(u64::from(snapshot.sleep_remaining_secs)).as_countdown()
        ),
        SleepTimerState::Running => {
            CoreDuration::from_seconds(u64::from(snapshot.sleep_remaining_secs)).as_countdown()
        }
    };

    format!(
        "[{}] {} {}/{} | voice: {} | auto: {} | sleep: {}",
        state,
        snapshot.title.as_deref().unwrap_or("(no story)"),
        (snapshot.unit_index + 1).min(snapshot.unit_count),
        snapshot.unit_count,
        snapshot.source,
        snapshot.auto_play,
        sleep
    )
}

fn print_status(term: &Term, snapshot: &NarrationSnapshot) -> Result<()> {
    term.write_line(&format!("  {}", style(status_line(snapshot)).dim()))
        .context("Failed to write status")
}

fn print_notice(term: &Term, notice: &NarrationNotice) -> Result<()> {
    let line = match notice {
        NarrationNotice::StoryLoaded { title, .. } => {
            format!("\n  {}", style(title).bold().cyan())
        }
        NarrationNotice::HandedOff { to, .. } => {
            format!("  {} Up next: {}", style("↪").cyan(), to)
        }
        NarrationNotice::Finished { .. } => format!("  {}", style("The End").bold()),
        NarrationNotice::SleepTimerExpired => {
            format!("  {} Sleep timer ended", style("☾").yellow())
        }
        NarrationNotice::FellBackToSpeech { reason } => {
            log::warn!("Recording unavailable: {}", reason);
            format!(
                "  {} Your recording could not be played, using the AI voice",
                style("!").yellow().bold()
            )
        }
        NarrationNotice::PlaybackFailed { reason } => {
            format!("  {} Playback stopped: {}", style("✗").red().bold(), reason)
        }
        NarrationNotice::SpeakingUnit { index, total, .. } => {
            log::debug!("Speaking unit {}/{}", index + 1, total);
            return Ok(());
        }
    };
    term.write_line(&line).context("Failed to write notice")
}

fn print_error(err: &NarrationError) {
    log::debug!("Player action failed: {}", err);
    println!("  {} {}", style("✗").red().bold(), err.user_message());
}

fn print_controls(term: &Term) -> Result<()> {
    term.write_line("  Controls:")?;
    term.write_line("    Space - Play/Pause     R - Restart    M - Mute")?;
    term.write_line("    A     - Auto-play mode T - Sleep timer Q/Esc - Quit")?;
    Ok(())
}
