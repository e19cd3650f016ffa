//! Cadence - Playback Control
//!
//! Client-side playback controller for Cadence.
//!
//! This crate provides:
//! - Drift-free progress clock (anchored to wall-clock time, not accumulated)
//! - Queue navigation (linear and shuffled, next/back, auto-advance)
//! - Seek with clamping
//! - Lifecycle events (start, end, skip) for an external event log
//! - Display helpers (`M:SS` elapsed/remaining)
//! - A tokio runtime that serializes commands and ticks on one task
//!
//! # Architecture
//!
//! `cadence-playback` does not decode or output audio. Progress is simulated
//! from elapsed time, and storage is delegated to a [`PlaybackEventSink`].
//! The controller itself is synchronous; [`PlaybackRuntime`] wires it to a
//! periodic timer that only runs while something is playing.
//!
//! # Example: Driving the controller by hand
//!
//! ```rust
//! use cadence_playback::{Clock, ManualClock, PlaybackController, QueueSource, Song};
//!
//! let clock = ManualClock::new();
//! let source = QueueSource::new(vec![
//!     Song::new(1, "Opening", "The Band", 180.0),
//!     Song::new(2, "Closing", "The Band", 200.0),
//! ]);
//! let mut controller = PlaybackController::builder(source)
//!     .clock(clock.clone())
//!     .build();
//!
//! controller.play();
//! clock.advance_secs(42.0);
//! controller.tick(clock.now());
//! assert_eq!(controller.time_display().elapsed_label(), "0:42");
//!
//! // Reaching the end of a song moves to the next one
//! let state = controller.tick(clock.at(180.0));
//! assert_eq!(state.current_index(), 1);
//! assert_eq!(state.progress(), 0.0);
//! ```
//!
//! # Example: Timer-driven playback
//!
//! ```rust,no_run
//! use cadence_playback::{PlaybackConfig, PlaybackController, PlaybackRuntime, QueueSource};
//!
//! # async fn run(source: QueueSource) -> cadence_playback::Result<()> {
//! let controller = PlaybackController::new(source, PlaybackConfig::default());
//! let handle = PlaybackRuntime::spawn(controller);
//!
//! handle.play().await?;
//! handle.toggle_shuffle().await?;
//! handle.skip_next().await?;
//!
//! let mut updates = handle.subscribe();
//! updates.changed().await.ok();
//! println!("{}", updates.borrow().time_display().elapsed_label());
//!
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod clock;
mod config;
mod controller;
pub mod display;
mod error;
pub mod events;
mod history;
mod runtime;
pub mod shuffle;
mod transport;
pub mod types;

// Public exports
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use self::config::PlaybackConfig;
pub use controller::{PlaybackController, PlaybackControllerBuilder, PlaybackState};
pub use display::{format_duration, TimeDisplay};
pub use error::{PlaybackError, Result};
pub use events::{ChannelSink, NullSink, PlaybackEvent, PlaybackEventKind, PlaybackEventSink};
pub use history::{HistoryRecord, PlaybackHistory};
pub use runtime::{PlaybackCommand, PlaybackHandle, PlaybackRuntime};
pub use shuffle::{shuffle_order, QueueMode};
pub use transport::{PlaybackAnchor, Transport};
pub use types::{PlaylistSummary, QueueSource, Song, SongId};
