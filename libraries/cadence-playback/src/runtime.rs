//! Async playback runtime
//!
//! Runs a [`PlaybackController`] on a single tokio task. User commands arrive
//! over a channel and ticks come from an interval timer; the task handles one
//! at a time, so the controller never needs a lock.
//!
//! The ticker only exists while playback is running. It is created when the
//! transport starts playing and dropped as soon as it stops, and it is owned
//! by the task, so shutting down or dropping every handle cancels it on every
//! exit path.

use crate::{
    controller::{PlaybackController, PlaybackState},
    error::{PlaybackError, Result},
};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Pending command capacity
const COMMAND_BUFFER: usize = 32;

/// Commands sent to the playback task
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    /// Start or resume playback
    Play,

    /// Pause playback
    Pause,

    /// Play if paused, pause if playing
    TogglePlayback,

    /// Seek to position (in seconds)
    Seek(f64),

    /// Skip to next song
    SkipNext,

    /// Go back (restart or previous song)
    SkipBack,

    /// Toggle shuffle mode
    ToggleShuffle,

    /// Stop the task
    Shutdown,
}

/// Spawns playback tasks
pub struct PlaybackRuntime;

impl PlaybackRuntime {
    /// Spawn the playback task on the current tokio runtime
    ///
    /// The task ends on [`PlaybackHandle::shutdown`] or when the handle is
    /// dropped.
    pub fn spawn(controller: PlaybackController) -> PlaybackHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(controller.state().clone());

        let task = tokio::spawn(run(controller, command_rx, state_tx));

        PlaybackHandle {
            command_tx,
            state_rx,
            task,
        }
    }
}

/// Handle to a running playback task
pub struct PlaybackHandle {
    command_tx: mpsc::Sender<PlaybackCommand>,
    state_rx: watch::Receiver<PlaybackState>,
    task: JoinHandle<()>,
}

impl PlaybackHandle {
    /// Queue a command for the playback task
    pub async fn send(&self, command: PlaybackCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| PlaybackError::RuntimeClosed)
    }

    pub async fn play(&self) -> Result<()> {
        self.send(PlaybackCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(PlaybackCommand::Pause).await
    }

    pub async fn toggle_playback(&self) -> Result<()> {
        self.send(PlaybackCommand::TogglePlayback).await
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        self.send(PlaybackCommand::Seek(seconds)).await
    }

    pub async fn skip_next(&self) -> Result<()> {
        self.send(PlaybackCommand::SkipNext).await
    }

    pub async fn skip_back(&self) -> Result<()> {
        self.send(PlaybackCommand::SkipBack).await
    }

    pub async fn toggle_shuffle(&self) -> Result<()> {
        self.send(PlaybackCommand::ToggleShuffle).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlaybackState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified after every command and tick
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_rx.clone()
    }

    /// Whether the playback task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(self) -> Result<()> {
        self.command_tx.send(PlaybackCommand::Shutdown).await.ok();
        self.task.await.map_err(|_| PlaybackError::RuntimeClosed)
    }
}

async fn run(
    mut controller: PlaybackController,
    mut command_rx: mpsc::Receiver<PlaybackCommand>,
    state_tx: watch::Sender<PlaybackState>,
) {
    let period = controller.config().tick_interval();
    let mut ticker: Option<Interval> = None;
    info!(tick_ms = period.as_millis() as u64, "Playback runtime started");

    loop {
        sync_ticker(&mut ticker, controller.is_playing(), period);

        tokio::select! {
            command = command_rx.recv() => match command {
                Some(PlaybackCommand::Shutdown) | None => break,
                Some(command) => apply(&mut controller, command),
            },
            () = next_tick(&mut ticker) => {
                let now = controller.now();
                controller.tick(now);
            }
        }

        state_tx.send_replace(controller.state().clone());
    }

    info!("Playback runtime stopped");
}

fn apply(controller: &mut PlaybackController, command: PlaybackCommand) {
    debug!(?command, "Applying playback command");
    match command {
        PlaybackCommand::Play => controller.play(),
        PlaybackCommand::Pause => controller.pause(),
        PlaybackCommand::TogglePlayback => controller.toggle_playback(),
        PlaybackCommand::Seek(seconds) => controller.seek(seconds),
        PlaybackCommand::SkipNext => controller.skip_next(),
        PlaybackCommand::SkipBack => controller.skip_back(),
        PlaybackCommand::ToggleShuffle => controller.toggle_shuffle(),
        PlaybackCommand::Shutdown => controller.state(),
    };
}

/// Start the ticker when playback runs, drop it when playback stops
fn sync_ticker(ticker: &mut Option<Interval>, playing: bool, period: Duration) {
    match (playing, ticker.is_some()) {
        (true, false) => {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            // Progress comes from the anchor, so late ticks need no catch-up
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *ticker = Some(interval);
            trace!("Ticker started");
        }
        (false, true) => {
            *ticker = None;
            trace!("Ticker cancelled");
        }
        _ => {}
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
