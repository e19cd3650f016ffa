//! Error types for playback control
//!
//! Controller commands are total and never fail. Errors only surface at the
//! seams: event sinks, the async runtime and configuration loading.

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Event sink could not accept a lifecycle event
    #[error("Event sink unavailable: {0}")]
    SinkUnavailable(String),

    /// The playback runtime task has already stopped
    #[error("Playback runtime closed")]
    RuntimeClosed,

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
