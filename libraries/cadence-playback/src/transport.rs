//! Transport state: stopped, or playing from an anchor
//!
//! Progress while playing is never accumulated tick over tick. Instead the
//! anchor records when playback (re)started and from which position, and the
//! live position is `progress_at_start + (now - started_at)`. A late or
//! skipped tick therefore cannot introduce drift.

use std::time::Instant;

/// Reference point for computing live progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackAnchor {
    /// Instant playback (re)started
    pub started_at: Instant,

    /// Song position in seconds at `started_at`
    pub progress_at_start: f64,
}

impl PlaybackAnchor {
    pub fn new(started_at: Instant, progress_at_start: f64) -> Self {
        Self {
            started_at,
            progress_at_start,
        }
    }

    /// Seconds elapsed since the anchor
    ///
    /// An instant before the anchor (clock skew, stale tick) counts as zero.
    pub fn elapsed_at(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started_at).as_secs_f64()
    }

    /// Projected song position at `now`
    pub fn progress_at(&self, now: Instant) -> f64 {
        self.progress_at_start + self.elapsed_at(now)
    }
}

/// Whether playback is running
///
/// The anchor only exists while playing, so a playing state without an
/// anchor cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Transport {
    /// Paused, or stopped at the end of the queue
    #[default]
    Stopped,

    /// Playing from the given anchor
    Playing { anchor: PlaybackAnchor },
}

impl Transport {
    /// Start playing at `now` from `progress`
    pub fn playing(now: Instant, progress: f64) -> Self {
        Self::Playing {
            anchor: PlaybackAnchor::new(now, progress),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }

    /// Anchor while playing, `None` while stopped
    pub fn anchor(&self) -> Option<&PlaybackAnchor> {
        match self {
            Self::Playing { anchor } => Some(anchor),
            Self::Stopped => None,
        }
    }
}
