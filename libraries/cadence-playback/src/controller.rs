//! Playback controller - queue navigation and progress clock
//!
//! Owns the authoritative [`PlaybackState`] for one mounted queue. Every
//! mutation goes through a command (`play`, `pause`, `seek`, `skip_next`,
//! `skip_back`, `toggle_shuffle`) or the periodic [`PlaybackController::tick`].
//! Commands are total: invalid input is clamped, commands on an empty queue
//! do nothing, and event sink failures are logged and ignored.

use crate::{
    clock::{Clock, SystemClock},
    config::PlaybackConfig,
    display::TimeDisplay,
    events::{NullSink, PlaybackEvent, PlaybackEventSink},
    shuffle::QueueMode,
    transport::{PlaybackAnchor, Transport},
    types::{PlaylistSummary, QueueSource, Song, SongId},
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Snapshot of playback for one mounted queue
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    queue: Vec<Song>,
    current_index: usize,
    transport: Transport,
    progress: f64,
    mode: QueueMode,
}

impl PlaybackState {
    /// Initial state: first song, stopped at 0, linear order
    pub fn new(queue: Vec<Song>) -> Self {
        Self {
            queue: queue.into_iter().map(Song::sanitized).collect(),
            current_index: 0,
            transport: Transport::Stopped,
            progress: 0.0,
            mode: QueueMode::Linear,
        }
    }

    pub fn queue(&self) -> &[Song] {
        &self.queue
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current song, `None` only for an empty queue
    pub fn current_song(&self) -> Option<&Song> {
        self.queue.get(self.current_index)
    }

    /// Duration of the current song, 0 for an empty queue
    pub fn duration(&self) -> f64 {
        self.current_song().map_or(0.0, |s| s.duration)
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn anchor(&self) -> Option<&PlaybackAnchor> {
        self.transport.anchor()
    }

    /// Position in seconds as of the last command or tick
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Position projected to `now`; equals `progress()` while stopped
    pub fn live_progress(&self, now: Instant) -> f64 {
        self.transport
            .anchor()
            .map_or(self.progress, |anchor| anchor.progress_at(now))
    }

    pub fn mode(&self) -> &QueueMode {
        &self.mode
    }

    pub fn is_shuffled(&self) -> bool {
        self.mode.is_shuffled()
    }

    /// Shuffle order while shuffled
    pub fn shuffle_order(&self) -> Option<&[usize]> {
        match &self.mode {
            QueueMode::Shuffled { order, .. } => Some(order),
            QueueMode::Linear => None,
        }
    }

    /// Position within the shuffle order while shuffled
    pub fn shuffle_position(&self) -> Option<usize> {
        match &self.mode {
            QueueMode::Shuffled { position, .. } => Some(*position),
            QueueMode::Linear => None,
        }
    }

    /// Elapsed/remaining display values for the current song
    pub fn time_display(&self) -> TimeDisplay {
        TimeDisplay::new(self.progress, self.duration())
    }
}

/// Builder for [`PlaybackController`] with injectable collaborators
pub struct PlaybackControllerBuilder {
    source: QueueSource,
    config: PlaybackConfig,
    clock: Option<Arc<dyn Clock>>,
    rng: Option<Box<dyn RngCore + Send>>,
    sink: Option<Arc<dyn PlaybackEventSink>>,
}

impl PlaybackControllerBuilder {
    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source for commands (default: system clock)
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Randomness for shuffle orders (default: seeded from config or entropy)
    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Receiver of lifecycle events (default: discard)
    pub fn sink(mut self, sink: Arc<dyn PlaybackEventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> PlaybackController {
        let rng = self.rng.unwrap_or_else(|| match self.config.shuffle_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        });

        debug!(
            songs = self.source.songs.len(),
            liked = self.source.liked_song_ids.len(),
            playlists = self.source.playlists.len(),
            "Mounting playback controller"
        );

        PlaybackController {
            state: PlaybackState::new(self.source.songs),
            liked_song_ids: self.source.liked_song_ids,
            playlists: self.source.playlists,
            config: self.config,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            rng,
            sink: self.sink.unwrap_or_else(|| Arc::new(NullSink)),
            finished: false,
        }
    }
}

/// Playback state machine for one mounted queue
///
/// Single-owner and synchronous. For timer-driven use, hand it to
/// [`crate::PlaybackRuntime`], which serializes commands and ticks.
pub struct PlaybackController {
    state: PlaybackState,
    liked_song_ids: HashSet<SongId>,
    playlists: Vec<PlaylistSummary>,
    config: PlaybackConfig,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    sink: Arc<dyn PlaybackEventSink>,
    /// Current song already reported as played to the end
    finished: bool,
}

impl PlaybackController {
    /// Mount a controller with the system clock and no event sink
    pub fn new(source: QueueSource, config: PlaybackConfig) -> Self {
        Self::builder(source).config(config).build()
    }

    pub fn builder(source: QueueSource) -> PlaybackControllerBuilder {
        PlaybackControllerBuilder {
            source,
            config: PlaybackConfig::default(),
            clock: None,
            rng: None,
            sink: None,
        }
    }

    // ===== Playback Control =====

    /// Start or resume playback from the current position
    ///
    /// A song that already finished at the end of the queue plays again
    /// from the beginning.
    pub fn play(&mut self) -> &PlaybackState {
        if self.state.is_playing() {
            return &self.state;
        }
        let Some(song_id) = self.state.current_song().map(|s| s.id) else {
            return &self.state;
        };

        if self.finished {
            self.finished = false;
            self.state.progress = 0.0;
        }

        let now = self.clock.now();
        self.state.transport = Transport::playing(now, self.state.progress);
        debug!(%song_id, progress = self.state.progress, "Playback started");

        if self.state.progress == 0.0 {
            self.emit(PlaybackEvent::start(song_id));
        }

        &self.state
    }

    /// Pause playback, keeping the current position
    pub fn pause(&mut self) -> &PlaybackState {
        let Transport::Playing { anchor } = self.state.transport else {
            return &self.state;
        };

        let now = self.clock.now();
        self.state.progress = self.settle(anchor.progress_at(now));
        self.state.transport = Transport::Stopped;
        debug!(progress = self.state.progress, "Playback paused");

        &self.state
    }

    /// Play if stopped, pause if playing
    pub fn toggle_playback(&mut self) -> &PlaybackState {
        if self.state.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seek within the current song
    ///
    /// The target is clamped to `[0, duration]` (only to `>= 0` when
    /// `clamp_seek` is disabled). While playing the anchor moves to the
    /// target; while stopped only the position changes.
    pub fn seek(&mut self, target: f64) -> &PlaybackState {
        if self.state.current_song().is_none() {
            return &self.state;
        }

        let target = self.clamp_seek_target(target);
        self.finished = false;
        self.state.progress = target;
        if self.state.is_playing() {
            self.state.transport = Transport::playing(self.clock.now(), target);
        }
        debug!(progress = target, "Seeked");

        &self.state
    }

    /// Toggle between linear and shuffled traversal
    ///
    /// Enabling shuffle builds a fresh order starting at the current song.
    /// Neither direction changes the current song or position.
    pub fn toggle_shuffle(&mut self) -> &PlaybackState {
        if self.state.queue.is_empty() {
            return &self.state;
        }

        self.state.mode = if self.state.is_shuffled() {
            QueueMode::Linear
        } else {
            QueueMode::shuffled(
                self.state.queue.len(),
                self.state.current_index,
                self.rng.as_mut(),
            )
        };
        debug!(shuffled = self.state.is_shuffled(), "Shuffle toggled");

        &self.state
    }

    /// Skip to the next song (user action)
    ///
    /// Reports a skip for the song being left. On the last song playback
    /// stops in place instead of wrapping around, and nothing is reported
    /// when it was not playing.
    pub fn skip_next(&mut self) -> &PlaybackState {
        let Some(song_id) = self.state.current_song().map(|s| s.id) else {
            return &self.state;
        };

        if self.state.is_playing() || self.next_index().is_some() {
            self.emit(PlaybackEvent::skip(song_id));
        }
        let now = self.clock.now();
        self.advance(now);

        &self.state
    }

    /// Go back (user action)
    ///
    /// Past the restart threshold this restarts the current song. Otherwise
    /// it moves to the previous song, or restarts when already at the first.
    pub fn skip_back(&mut self) -> &PlaybackState {
        if self.state.current_song().is_none() {
            return &self.state;
        }

        let now = self.clock.now();
        if self.state.live_progress(now) > self.config.restart_threshold_secs {
            self.restart_current(now);
            return &self.state;
        }

        let previous = match &mut self.state.mode {
            QueueMode::Shuffled { order, position } => {
                if *position == 0 {
                    None
                } else {
                    *position -= 1;
                    Some(order[*position])
                }
            }
            QueueMode::Linear => self.state.current_index.checked_sub(1),
        };

        match previous {
            Some(index) => self.start_song(index, now),
            None => self.restart_current(now),
        }

        &self.state
    }

    /// Recompute progress from the anchor, finishing the song if it is over
    ///
    /// Called by the periodic timer. Only `progress` changes unless the song
    /// has reached its end, in which case an end event is reported and
    /// playback moves on as with a skip.
    pub fn tick(&mut self, now: Instant) -> &PlaybackState {
        let Transport::Playing { anchor } = self.state.transport else {
            return &self.state;
        };
        let Some((song_id, duration)) = self.state.current_song().map(|s| (s.id, s.duration))
        else {
            return &self.state;
        };

        let projected = anchor.progress_at(now);
        if projected >= duration {
            debug!(%song_id, "Song finished");
            self.emit(PlaybackEvent::end(song_id));
            self.advance(now);
            self.finished = !self.state.is_playing();
        } else {
            self.state.progress = projected;
        }

        &self.state
    }

    // ===== State Queries =====

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.state.current_song()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Display values for the current song
    pub fn time_display(&self) -> TimeDisplay {
        self.state.time_display()
    }

    pub fn is_liked(&self, song_id: SongId) -> bool {
        self.liked_song_ids.contains(&song_id)
    }

    /// Whether the current song is liked
    pub fn is_current_liked(&self) -> bool {
        self.current_song().is_some_and(|s| self.is_liked(s.id))
    }

    /// Playlists the current song can be added to
    pub fn playlists(&self) -> &[PlaylistSummary] {
        &self.playlists
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Current instant according to the injected clock
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    // ===== Internal =====

    /// Move to the next song in traversal order, or stop at the end
    fn advance(&mut self, now: Instant) {
        match self.next_index() {
            Some(index) => {
                if let QueueMode::Shuffled { position, .. } = &mut self.state.mode {
                    *position += 1;
                }
                self.start_song(index, now);
            }
            None => {
                self.state.transport = Transport::Stopped;
                debug!(index = self.state.current_index, "Reached end of queue");
            }
        }
    }

    /// Song after the current one in traversal order
    fn next_index(&self) -> Option<usize> {
        match &self.state.mode {
            QueueMode::Shuffled { order, position } => order.get(position + 1).copied(),
            QueueMode::Linear => {
                let next = self.state.current_index + 1;
                (next < self.state.queue.len()).then_some(next)
            }
        }
    }

    /// Start the song at `index` from the beginning
    fn start_song(&mut self, index: usize, now: Instant) {
        self.finished = false;
        self.state.current_index = index;
        self.state.progress = 0.0;
        self.state.transport = Transport::playing(now, 0.0);

        if let Some(song_id) = self.state.current_song().map(|s| s.id) {
            debug!(%song_id, index, "Now playing");
            self.emit(PlaybackEvent::start(song_id));
        }
    }

    /// Rewind the current song, keeping play/pause as it was
    fn restart_current(&mut self, now: Instant) {
        self.finished = false;
        self.state.progress = 0.0;
        if self.state.is_playing() {
            self.state.transport = Transport::playing(now, 0.0);
        }
        debug!(index = self.state.current_index, "Restarted current song");
    }

    fn clamp_seek_target(&self, target: f64) -> f64 {
        if target.is_nan() {
            return 0.0;
        }
        let target = if self.config.clamp_seek {
            target.min(self.state.duration())
        } else {
            target
        };
        target.max(0.0)
    }

    /// Keep a projected position within the song when clamping is enabled
    fn settle(&self, progress: f64) -> f64 {
        if self.config.clamp_seek {
            progress.min(self.state.duration())
        } else {
            progress
        }
    }

    /// Best-effort delivery to the event sink
    fn emit(&self, event: PlaybackEvent) {
        if let Err(e) = self.sink.record(&event) {
            warn!(
                song_id = %event.song_id,
                kind = %event.kind,
                "Failed to record playback event: {}",
                e
            );
        }
    }
}
