//! In-memory playback history
//!
//! Bounded event log that doubles as a [`PlaybackEventSink`]. Keeps the same
//! shape as the persisted event rows (user, event name, song, date) and
//! answers the "recently played" query: finished songs, newest first.

use crate::config::PlaybackConfig;
use crate::error::Result;
use crate::events::{PlaybackEvent, PlaybackEventKind, PlaybackEventSink};
use crate::types::SongId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Default maximum number of records
const DEFAULT_MAX_SIZE: usize = 500;

/// One logged lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// User the event belongs to
    pub user_id: i64,

    #[serde(flatten)]
    pub event: PlaybackEvent,
}

/// Playback history with bounded size
///
/// Implements a ring buffer that automatically discards the oldest records.
#[derive(Debug)]
pub struct PlaybackHistory {
    /// History buffer (most recent = back)
    records: Mutex<VecDeque<HistoryRecord>>,

    /// Maximum history size
    max_size: usize,

    /// User stamped on every record
    user_id: i64,
}

impl PlaybackHistory {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self::for_user(max_size, 1)
    }

    /// Create history that records events for `user_id`
    pub fn for_user(max_size: usize, user_id: i64) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_size.min(DEFAULT_MAX_SIZE))),
            max_size,
            user_id,
        }
    }

    /// Create history sized and attributed from configuration
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::for_user(config.history_size, config.user_id)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an event to the history
    ///
    /// If history is full, the oldest record is discarded
    pub fn push(&self, event: PlaybackEvent) {
        if self.max_size == 0 {
            return;
        }

        let mut records = self.lock();
        if records.len() >= self.max_size {
            records.pop_front();
        }
        records.push_back(HistoryRecord {
            user_id: self.user_id,
            event,
        });
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Finished songs, newest first
    pub fn recently_played(&self) -> Vec<HistoryRecord> {
        let mut played: Vec<HistoryRecord> = self
            .lock()
            .iter()
            .filter(|r| r.event.kind == PlaybackEventKind::End)
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps
        played.reverse();
        played.sort_by(|a, b| b.event.at.cmp(&a.event.at));
        played
    }

    /// Number of times a song played to the end
    pub fn play_count(&self, song_id: SongId) -> usize {
        self.lock()
            .iter()
            .filter(|r| r.event.kind == PlaybackEventKind::End && r.event.song_id == song_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear all history
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Get maximum history size
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for PlaybackHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl PlaybackEventSink for PlaybackHistory {
    fn record(&self, event: &PlaybackEvent) -> Result<()> {
        self.push(event.clone());
        Ok(())
    }
}
