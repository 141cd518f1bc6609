use std::time::Duration;

/// Default volume for a freshly created player (percent)
pub const DEFAULT_VOLUME: u8 = 100;

/// Current playback state as published to observers.
///
/// There is a single writer: the [`Player`](crate::Player) controller.
/// The sync loop updates only the derived fields (`position`,
/// `active_cue`) through the controller's tick path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    /// Whether playback is running
    pub is_playing: bool,
    /// Last published playback position
    pub position: Duration,
    /// Total track duration; `None` until the media resource has loaded
    /// its metadata. Never treated as zero for range math.
    pub duration: Option<Duration>,
    /// Volume in percent, 0..=100
    pub volume: u8,
    /// Index of the currently active cue; `None` when no cue has started
    /// yet or no cues are loaded
    pub active_cue: Option<usize>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            position: Duration::ZERO,
            duration: None,
            volume: DEFAULT_VOLUME,
            active_cue: None,
        }
    }
}

impl PlaybackState {
    /// Volume mapped to the media resource's normalized 0.0..=1.0 domain
    #[must_use]
    pub fn volume_level(&self) -> f32 {
        f32::from(self.volume) / 100.0
    }

    /// Fraction of the track played, 0.0..=1.0, for driving a seek bar.
    ///
    /// Returns 0.0 while the duration is unknown or zero rather than
    /// propagating a NaN.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.duration {
            Some(duration) if !duration.is_zero() => {
                let fraction = self.position.as_secs_f32() / duration.as_secs_f32();
                fraction.clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}
