//! Playback lifecycle events
//!
//! The controller reports when a song starts, ends naturally or is skipped.
//! Storage lives elsewhere; the controller only hands events to a
//! [`PlaybackEventSink`] and never looks at the outcome beyond logging it.

use crate::error::{PlaybackError, Result};
use crate::types::SongId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Kind of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackEventKind {
    /// A song began playing from its start
    #[serde(rename = "playback_start")]
    Start,

    /// A song played through to its end
    #[serde(rename = "playback_end")]
    End,

    /// The user skipped away from a song
    #[serde(rename = "playback_skip")]
    Skip,
}

impl PlaybackEventKind {
    /// Event name as stored in the event log
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "playback_start",
            Self::End => "playback_end",
            Self::Skip => "playback_skip",
        }
    }
}

impl fmt::Display for PlaybackEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event emitted by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    /// What happened
    #[serde(rename = "event_name")]
    pub kind: PlaybackEventKind,

    /// Song the event is about
    pub song_id: SongId,

    /// Wall-clock time the event was emitted
    #[serde(rename = "event_date")]
    pub at: DateTime<Utc>,
}

impl PlaybackEvent {
    /// Create an event stamped with the current wall-clock time
    pub fn now(kind: PlaybackEventKind, song_id: SongId) -> Self {
        Self {
            kind,
            song_id,
            at: Utc::now(),
        }
    }

    pub fn start(song_id: SongId) -> Self {
        Self::now(PlaybackEventKind::Start, song_id)
    }

    pub fn end(song_id: SongId) -> Self {
        Self::now(PlaybackEventKind::End, song_id)
    }

    pub fn skip(song_id: SongId) -> Self {
        Self::now(PlaybackEventKind::Skip, song_id)
    }
}

/// Receiver of lifecycle events
///
/// Fire-and-forget: implementations should return quickly. An error is
/// logged by the controller and otherwise ignored, so a failing sink can
/// never stall or undo a playback transition.
pub trait PlaybackEventSink: Send + Sync {
    /// Record one event
    fn record(&self, event: &PlaybackEvent) -> Result<()>;
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PlaybackEventSink for NullSink {
    fn record(&self, _event: &PlaybackEvent) -> Result<()> {
        Ok(())
    }
}

/// Sink that forwards events into a tokio channel
///
/// Useful for handing events to an async persistence task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that gets its events
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PlaybackEventSink for ChannelSink {
    fn record(&self, event: &PlaybackEvent) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| PlaybackError::SinkUnavailable("event receiver dropped".to_string()))
    }
}
