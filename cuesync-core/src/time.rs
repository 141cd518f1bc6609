//! Time formatting and conversion utilities.
//!
//! Durations coming from external transcripts arrive as floating-point
//! seconds; the single gate from floats into [`Duration`] lives here so
//! NaN and negative values never reach the engine.

use std::time::Duration;

/// Format a playback time as `MM:SS`, zero-padded.
///
/// `None` means the value is not yet known (e.g. duration before the
/// media resource has loaded metadata) and formats as `00:00`.
#[must_use]
pub fn format_time(time: Option<Duration>) -> String {
    let Some(time) = time else {
        return "00:00".to_string();
    };

    let total_secs = time.as_secs();
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Convert floating-point seconds to a [`Duration`].
///
/// Returns `None` for NaN, negative, or non-finite input.
#[must_use]
pub fn duration_from_secs(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}
