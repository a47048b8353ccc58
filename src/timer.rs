//! Vote-phase countdown timer.
//!
//! Ticking runs as a spawned task that owns nothing but a handle to the shared
//! counters. Every start/pause/resume/stop bumps an epoch, and a tick only
//! applies while its epoch is current, so a tick racing a pause can never
//! decrement a paused timer.

use crate::types::TimerStatus;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_secs(1);

/// One-shot side effect when the countdown reaches zero
pub trait TimerAlert: Send + Sync {
    fn fire(&self) -> std::io::Result<()>;
}

/// Rings the terminal bell
pub struct TerminalBell;

impl TimerAlert for TerminalBell {
    fn fire(&self) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "\x07Time's up! Reveal the imposters when you're ready.")?;
        out.flush()
    }
}

pub struct SilentAlert;

impl TimerAlert for SilentAlert {
    fn fire(&self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
    pub status: TimerStatus,
    pub display: String,
}

#[derive(Debug)]
struct TimerShared {
    duration: u32,
    remaining: u32,
    status: TimerStatus,
    epoch: u64,
}

pub struct CountdownTimer {
    shared: Arc<Mutex<TimerShared>>,
    ticker: Option<JoinHandle<()>>,
    alert: Arc<dyn TimerAlert>,
    /// Count of expiries so far
    expirations: Arc<watch::Sender<u64>>,
}

impl CountdownTimer {
    pub fn new(alert: Arc<dyn TimerAlert>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(TimerShared {
                duration: 0,
                remaining: 0,
                status: TimerStatus::Stopped,
                epoch: 0,
            })),
            ticker: None,
            alert,
            expirations: Arc::new(watch::channel(0).0),
        }
    }

    /// Notified on every expiry. Closes when the timer is dropped.
    pub fn expirations(&self) -> watch::Receiver<u64> {
        self.expirations.subscribe()
    }

    /// Start counting down from `duration` seconds. No-op while running.
    pub async fn start(&mut self, duration: u32) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.status == TimerStatus::Running {
            tracing::debug!("Timer already running, ignoring start");
            return false;
        }

        Self::cancel_ticker(&mut self.ticker);
        shared.duration = duration;
        shared.remaining = duration;
        shared.epoch += 1;

        if duration == 0 {
            shared.status = TimerStatus::Expired;
            drop(shared);
            expire(self.alert.as_ref(), &self.expirations);
            return true;
        }

        shared.status = TimerStatus::Running;
        let epoch = shared.epoch;
        drop(shared);

        self.spawn_ticker(epoch);
        tracing::info!("Vote timer started: {}", format_mm_ss(duration));
        true
    }

    /// Freeze the countdown. Only valid while running.
    pub async fn pause(&mut self) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.status != TimerStatus::Running {
            tracing::debug!("Timer not running ({:?}), ignoring pause", shared.status);
            return false;
        }

        Self::cancel_ticker(&mut self.ticker);
        shared.status = TimerStatus::Paused;
        shared.epoch += 1;
        tracing::info!("Vote timer paused at {}", format_mm_ss(shared.remaining));
        true
    }

    /// Continue from the preserved remaining time. Only valid while paused.
    pub async fn resume(&mut self) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.status != TimerStatus::Paused {
            tracing::debug!("Timer not paused ({:?}), ignoring resume", shared.status);
            return false;
        }

        shared.status = TimerStatus::Running;
        shared.epoch += 1;
        let epoch = shared.epoch;
        tracing::info!("Vote timer resumed at {}", format_mm_ss(shared.remaining));
        drop(shared);

        self.spawn_ticker(epoch);
        true
    }

    /// Cancel from any state
    pub async fn stop(&mut self) {
        let mut shared = self.shared.lock().await;
        Self::cancel_ticker(&mut self.ticker);
        shared.remaining = 0;
        shared.status = TimerStatus::Stopped;
        shared.epoch += 1;
        tracing::info!("Vote timer stopped");
    }

    pub async fn status(&self) -> TimerStatus {
        self.shared.lock().await.status
    }

    pub async fn remaining(&self) -> u32 {
        self.shared.lock().await.remaining
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let shared = self.shared.lock().await;
        TimerSnapshot {
            duration_seconds: shared.duration,
            remaining_seconds: shared.remaining,
            status: shared.status,
            display: format_mm_ss(shared.remaining),
        }
    }

    fn cancel_ticker(ticker: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }

    fn spawn_ticker(&mut self, epoch: u64) {
        Self::cancel_ticker(&mut self.ticker);

        let shared = self.shared.clone();
        let alert = self.alert.clone();
        let expirations = self.expirations.clone();
        self.ticker = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(TICK).await;

                let expired = {
                    let mut shared = shared.lock().await;
                    if shared.epoch != epoch || shared.status != TimerStatus::Running {
                        return;
                    }
                    shared.remaining = shared.remaining.saturating_sub(1);
                    if shared.remaining == 0 {
                        shared.status = TimerStatus::Expired;
                    }
                    shared.remaining == 0
                };

                if expired {
                    tracing::info!("Vote timer expired");
                    expire(alert.as_ref(), &expirations);
                    return;
                }
            }
        }));
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        Self::cancel_ticker(&mut self.ticker);
    }
}

fn expire(alert: &dyn TimerAlert, expirations: &watch::Sender<u64>) {
    if let Err(e) = alert.fire() {
        tracing::warn!("Failed to fire timer alert: {}", e);
    }
    expirations.send_modify(|count| *count += 1);
}

/// Format seconds as zero-padded `MM:SS`. Minutes are not capped at 59.
pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
