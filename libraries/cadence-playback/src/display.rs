//! Derived display values for the playback bar

use serde::{Deserialize, Serialize};

/// Whole seconds, treating negative or non-finite input as zero
fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

/// Format seconds as `M:SS`
///
/// Fractional seconds are floored and minutes are unbounded, so an hour long
/// track shows as `60:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

/// Elapsed and remaining time of the current song, in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeDisplay {
    pub elapsed: u64,
    pub remaining: u64,
}

impl TimeDisplay {
    /// Build from live progress and song duration
    ///
    /// Remaining time saturates at zero when progress runs past the end
    /// before the next tick catches up.
    pub fn new(progress: f64, duration: f64) -> Self {
        let elapsed = whole_seconds(progress);
        let remaining = whole_seconds(duration).saturating_sub(elapsed);
        Self { elapsed, remaining }
    }

    pub fn elapsed_label(&self) -> String {
        format_duration(self.elapsed as f64)
    }

    pub fn remaining_label(&self) -> String {
        format!("-{}", format_duration(self.remaining as f64))
    }
}
