//! Owned one-second tickers
//!
//! A [`PeriodicTask`] sends [`Tick`]s into the service loop while it runs.
//! Each start gets a new epoch; ticks carrying an older epoch were queued
//! before a stop and are rejected by [`PeriodicTask::accepts`].

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    SleepTimer,
    RecordingElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub kind: TickKind,
    pub epoch: u64,
}

pub struct PeriodicTask {
    kind: TickKind,
    period: Duration,
    epoch: u64,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn new(kind: TickKind, period: Duration) -> Self {
        Self {
            kind,
            period,
            epoch: 0,
            handle: None,
        }
    }

    /// Starts ticking one period from now; no-op if already running
    pub fn start(&mut self, ticks: mpsc::UnboundedSender<Tick>) {
        if self.is_running() {
            return;
        }

        self.epoch += 1;
        let tick = Tick {
            kind: self.kind,
            epoch: self.epoch,
        };
        let period = self.period;

        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(tick).is_err() {
                    break;
                }
            }
        }));
        log::debug!("{:?} ticker started (epoch {})", self.kind, self.epoch);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::debug!("{:?} ticker stopped (epoch {})", self.kind, self.epoch);
        }
    }

    /// Runs or stops the ticker to match `should_run`
    pub fn reconcile(&mut self, should_run: bool, ticks: &mpsc::UnboundedSender<Tick>) {
        match (should_run, self.is_running()) {
            (true, false) => self.start(ticks.clone()),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// True for ticks from the current run
    pub fn accepts(&self, tick: &Tick) -> bool {
        tick.kind == self.kind && tick.epoch == self.epoch && self.is_running()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
