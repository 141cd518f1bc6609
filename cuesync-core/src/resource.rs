//! The media resource seam.
//!
//! The engine never decodes or streams audio itself; it drives anything
//! that can report a playback clock and accept transport commands. Every
//! call is an immediate, non-suspending state read or write, so the trait
//! is synchronous and implementations are expected to return without
//! waiting on I/O.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A playable media resource with a queryable clock.
///
/// Implementations are shared handles: the controller is the only caller
/// of the mutating methods, while the sync loop only reads
/// [`current_time`](MediaResource::current_time). The two lifecycle
/// events a resource produces (metadata loaded, playback ended) are
/// delivered by the embedding driver calling
/// [`Player::on_metadata_loaded`](crate::Player::on_metadata_loaded) and
/// [`Player::on_track_ended`](crate::Player::on_track_ended).
pub trait MediaResource: Send + Sync {
    /// Current playback position
    fn current_time(&self) -> Duration;

    /// Set the playback position
    fn set_current_time(&self, position: Duration);

    /// Total duration, once known
    fn duration(&self) -> Option<Duration>;

    /// Current volume in the normalized 0.0..=1.0 domain
    fn volume(&self) -> f32;

    /// Set the volume, normalized 0.0..=1.0
    fn set_volume(&self, volume: f32);

    /// Resume playback
    fn play(&self);

    /// Pause playback
    fn pause(&self);
}

struct TrackInner {
    /// Position accumulated up to the last pause/seek
    base: Duration,
    /// Set while playing; wall-clock time of the last resume
    resumed_at: Option<Instant>,
    duration: Option<Duration>,
    volume: f32,
    ended: bool,
}

impl TrackInner {
    /// Current position, folding elapsed wall-clock time into `base` when
    /// the track has run past its end. Reaching the end stops the clock,
    /// like a media element firing `ended`.
    fn position(&mut self) -> Duration {
        let mut position = self.base;
        if let Some(resumed_at) = self.resumed_at {
            position += resumed_at.elapsed();
        }
        if let Some(duration) = self.duration {
            if position >= duration {
                self.base = duration;
                self.resumed_at = None;
                self.ended = true;
                position = duration;
            }
        }
        position
    }
}

/// An in-memory media resource whose clock advances with wall time while
/// playing.
///
/// Useful for headless playback (the CLI front-end) and as the test
/// double for the engine. Clones share the same underlying track, so a
/// driver can keep a handle after attaching one to the player.
#[derive(Clone)]
pub struct SimulatedTrack {
    inner: Arc<Mutex<TrackInner>>,
}

impl SimulatedTrack {
    /// Create a track with an unknown duration (no end-of-track)
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackInner {
                base: Duration::ZERO,
                resumed_at: None,
                duration: None,
                volume: 1.0,
                ended: false,
            })),
        }
    }

    /// Create a track with a known duration
    #[must_use]
    pub fn with_duration(duration: Duration) -> Self {
        let track = Self::new();
        track.lock().duration = Some(duration);
        track
    }

    /// Whether the clock has run to the end of the track.
    ///
    /// Cleared by seeking; always `false` while the duration is unknown.
    #[must_use]
    pub fn has_ended(&self) -> bool {
        let mut inner = self.lock();
        let _ = inner.position();
        inner.ended
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaResource for SimulatedTrack {
    fn current_time(&self) -> Duration {
        self.lock().position()
    }

    fn set_current_time(&self, position: Duration) {
        let mut inner = self.lock();
        let clamped = match inner.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        inner.base = clamped;
        inner.ended = false;
        if inner.resumed_at.is_some() {
            inner.resumed_at = Some(Instant::now());
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.lock().duration
    }

    fn volume(&self) -> f32 {
        self.lock().volume
    }

    fn set_volume(&self, volume: f32) {
        self.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn play(&self) {
        let mut inner = self.lock();
        let _ = inner.position();
        inner.ended = false;
        if inner.resumed_at.is_none() {
            inner.resumed_at = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut inner = self.lock();
        let position = inner.position();
        inner.base = position;
        inner.resumed_at = None;
    }
}
