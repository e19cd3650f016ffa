//! Core types for playback control

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Unique song identifier from the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub i64);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SongId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Song information for the playback queue
///
/// Supplied by the library pages and never mutated by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Unique song identifier
    pub id: SongId,

    /// Song title
    pub name: String,

    /// Author (artist) name
    pub author: String,

    /// Duration in seconds, may be fractional
    pub duration: f64,
}

impl Song {
    /// Create a song, clamping negative or non-finite durations to zero
    pub fn new(
        id: impl Into<SongId>,
        name: impl Into<String>,
        author: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author: author.into(),
            duration: playable_duration(duration),
        }
    }

    /// Same song with its duration clamped as in [`Song::new`]
    ///
    /// Needed for songs built field by field or deserialized.
    pub fn sanitized(mut self) -> Self {
        self.duration = playable_duration(self.duration);
        self
    }
}

fn playable_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

/// Playlist a song can be added to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: i64,
    pub name: String,
}

/// Snapshot handed to the controller at mount
///
/// Contains the initial song queue plus the like/playlist metadata shown next
/// to the current song. There are no live updates; a new snapshot means a new
/// controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSource {
    /// Ordered songs to play
    pub songs: Vec<Song>,

    /// Songs the user has liked
    pub liked_song_ids: HashSet<SongId>,

    /// Playlists available for "add to playlist"
    pub playlists: Vec<PlaylistSummary>,
}

impl QueueSource {
    /// Create a source with the given songs and no metadata
    pub fn new(songs: Vec<Song>) -> Self {
        Self {
            songs,
            ..Default::default()
        }
    }

    /// Mark songs as liked
    pub fn with_liked(mut self, ids: impl IntoIterator<Item = SongId>) -> Self {
        self.liked_song_ids.extend(ids);
        self
    }

    /// Attach the user's playlists
    pub fn with_playlists(mut self, playlists: Vec<PlaylistSummary>) -> Self {
        self.playlists = playlists;
        self
    }
}
