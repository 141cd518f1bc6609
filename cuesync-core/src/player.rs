use crate::cue::CueSheet;
use crate::error::Result;
use crate::playback::PlaybackState;
use crate::resource::MediaResource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// Events published to observers (the UI) as playback state changes
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A new cue sheet was loaded
    CuesLoaded { count: usize },
    /// Playback was resumed
    Playing { position: Duration },
    /// Playback was paused
    Paused { position: Duration },
    /// Playback position was set directly
    Seeked { position: Duration },
    /// Volume changed
    VolumeChanged { volume: u8 },
    /// The media resource reported its duration
    MetadataLoaded { duration: Duration },
    /// Playback ran to the end of the track
    TrackEnded { position: Duration },
    /// Regular position update from the sync loop
    PositionChanged { position: Duration },
    /// The active cue changed
    CueChanged { index: Option<usize> },
}

struct PlayerInner {
    state: PlaybackState,
    cues: CueSheet,
    resource: Option<Box<dyn MediaResource>>,
}

/// The playback controller.
///
/// Owns the media resource handle and all writes to [`PlaybackState`].
/// User commands mutate the resource and the state synchronously, so a
/// read issued right after a command observes the new value; the sync
/// loop's tick path updates only the derived fields (`position`,
/// `active_cue`).
///
/// Every transport command silently degrades to a no-op while no media
/// resource is attached - playback readiness is asynchronous and outside
/// the caller's control.
pub struct Player {
    inner: RwLock<PlayerInner>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl Player {
    /// Create a new player with no resource and an empty cue sheet
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    /// Attach the media resource handle.
    ///
    /// The stored volume is applied to the resource so a handle attached
    /// after a volume change starts at the right level.
    pub async fn attach_resource(&self, resource: Box<dyn MediaResource>) {
        let mut inner = self.inner.write().await;
        resource.set_volume(inner.state.volume_level());
        inner.resource = Some(resource);
        info!("Media resource attached");
    }

    /// Replace the cue sheet atomically.
    ///
    /// The previous active index is cleared; the next tick or seek
    /// resolves against the new sheet.
    pub async fn load_cues(&self, cues: CueSheet) {
        let count = cues.len();
        {
            let mut inner = self.inner.write().await;
            inner.cues = cues;
            inner.state.active_cue = None;
        }
        info!("Loaded {count} cues");
        let _ = self.event_tx.send(PlayerEvent::CuesLoaded { count });
    }

    /// Toggle between playing and paused
    pub async fn toggle_play_pause(&self) {
        let (playing, position) = {
            let mut inner = self.inner.write().await;
            let Some(resource) = inner.resource.as_ref() else {
                debug!("Ignoring play/pause: no media resource attached");
                return;
            };
            let playing = !inner.state.is_playing;
            if playing {
                resource.play();
            } else {
                resource.pause();
            }
            let position = resource.current_time();
            inner.state.is_playing = playing;
            (playing, position)
        };

        let event = if playing {
            PlayerEvent::Playing { position }
        } else {
            PlayerEvent::Paused { position }
        };
        let _ = self.event_tx.send(event);
    }

    /// Seek to an absolute position, clamped to the track duration when
    /// it is known.
    ///
    /// The published position and active cue update before this returns,
    /// so scrubbing stays responsive even while paused.
    pub async fn seek_to(&self, position: Duration) {
        let (clamped, index, index_changed) = {
            let mut inner = self.inner.write().await;
            let Some(resource) = inner.resource.as_ref() else {
                debug!("Ignoring seek: no media resource attached");
                return;
            };
            let clamped = match inner.state.duration {
                Some(duration) => position.min(duration),
                None => position,
            };
            resource.set_current_time(clamped);
            let index = inner.cues.active_index(clamped);
            let index_changed = index != inner.state.active_cue;
            inner.state.position = clamped;
            inner.state.active_cue = index;
            (clamped, index, index_changed)
        };

        debug!("Seeked to {clamped:?}");
        let _ = self.event_tx.send(PlayerEvent::Seeked { position: clamped });
        if index_changed {
            let _ = self.event_tx.send(PlayerEvent::CueChanged { index });
        }
    }

    /// Seek forward by `step` from the resource's current position
    pub async fn seek_forward(&self, step: Duration) {
        let current = {
            let inner = self.inner.read().await;
            let Some(resource) = inner.resource.as_ref() else {
                return;
            };
            resource.current_time()
        };
        self.seek_to(current + step).await;
    }

    /// Seek backward by `step`, stopping at the start of the track
    pub async fn seek_back(&self, step: Duration) {
        let current = {
            let inner = self.inner.read().await;
            let Some(resource) = inner.resource.as_ref() else {
                return;
            };
            resource.current_time()
        };
        self.seek_to(current.saturating_sub(step)).await;
    }

    /// Seek to the start of the track
    pub async fn skip_to_start(&self) {
        self.seek_to(Duration::ZERO).await;
    }

    /// Seek to the end of the track. No-op while the duration is unknown;
    /// an unknown duration is never treated as zero.
    pub async fn skip_to_end(&self) {
        let duration = self.inner.read().await.state.duration;
        match duration {
            Some(duration) => self.seek_to(duration).await,
            None => debug!("Ignoring skip to end: duration unknown"),
        }
    }

    /// Seek to the start of the cue at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CueOutOfRange`](crate::CoreError::CueOutOfRange)
    /// if no cue exists at `index`.
    pub async fn jump_to_cue(&self, index: usize) -> Result<()> {
        let start = {
            let inner = self.inner.read().await;
            inner.cues.get(index)?.start
        };
        self.seek_to(start).await;
        Ok(())
    }

    /// Set the volume in percent. Out-of-range values are clamped to
    /// 0..=100; the resource receives the normalized equivalent.
    pub async fn set_volume(&self, volume: i32) {
        let clamped = volume.clamp(0, 100);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let volume = clamped as u8;

        let mut inner = self.inner.write().await;
        let Some(resource) = inner.resource.as_ref() else {
            debug!("Ignoring volume change: no media resource attached");
            return;
        };
        resource.set_volume(f32::from(volume) / 100.0);
        inner.state.volume = volume;
        drop(inner);

        let _ = self.event_tx.send(PlayerEvent::VolumeChanged { volume });
    }

    /// Record the track duration once the resource has loaded metadata
    pub async fn on_metadata_loaded(&self, duration: Duration) {
        {
            let mut inner = self.inner.write().await;
            inner.state.duration = Some(duration);
        }
        info!("Media metadata loaded: duration {duration:?}");
        let _ = self.event_tx.send(PlayerEvent::MetadataLoaded { duration });
    }

    /// React to the resource reaching the end of the track.
    ///
    /// Playback stops but the position keeps its end-of-track value, so
    /// the user can still scrub back or restart explicitly.
    pub async fn on_track_ended(&self) {
        let position = {
            let mut inner = self.inner.write().await;
            inner.state.is_playing = false;
            inner.state.position
        };
        info!("Track ended at {position:?}");
        let _ = self.event_tx.send(PlayerEvent::TrackEnded { position });
    }

    /// Sample the media clock and publish derived state.
    ///
    /// Called once per frame by the sync loop while playing. Updates and
    /// publishes only what actually changed, so observers see no
    /// redundant notifications. This is the sync loop's single write
    /// path; it never touches `is_playing`, `volume`, or the resource's
    /// position.
    pub(crate) async fn publish_tick(&self) {
        let (position_changed, position, index_changed, index) = {
            let mut inner = self.inner.write().await;
            let Some(resource) = inner.resource.as_ref() else {
                return;
            };
            let position = resource.current_time();
            let index = inner.cues.active_index(position);
            let position_changed = position != inner.state.position;
            let index_changed = index != inner.state.active_cue;
            if position_changed {
                inner.state.position = position;
            }
            if index_changed {
                inner.state.active_cue = index;
            }
            (position_changed, position, index_changed, index)
        };

        if index_changed {
            let _ = self.event_tx.send(PlayerEvent::CueChanged { index });
        }
        if position_changed {
            let _ = self.event_tx.send(PlayerEvent::PositionChanged { position });
        }
    }

    /// Get a snapshot of the current playback state
    pub async fn snapshot(&self) -> PlaybackState {
        self.inner.read().await.state.clone()
    }

    /// Get a copy of the loaded cue sheet
    pub async fn cues(&self) -> CueSheet {
        self.inner.read().await.cues.clone()
    }

    /// Check if currently playing
    pub async fn is_playing(&self) -> bool {
        self.inner.read().await.state.is_playing
    }
}

impl Default for Player {
    fn default() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(PlayerInner {
                state: PlaybackState::default(),
                cues: CueSheet::default(),
                resource: None,
            }),
            event_tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::Cue;
    use crate::resource::SimulatedTrack;

    fn test_cues() -> CueSheet {
        CueSheet::new(vec![
            Cue::new("a", Duration::ZERO),
            Cue::new("b", Duration::from_secs(10)),
            Cue::new("c", Duration::from_secs(20)),
        ])
    }

    async fn player_with_track() -> (Arc<Player>, SimulatedTrack) {
        let player = Player::new();
        let track = SimulatedTrack::new();
        player.attach_resource(Box::new(track.clone())).await;
        player.load_cues(test_cues()).await;
        (player, track)
    }

    #[tokio::test]
    async fn test_commands_without_resource_are_noops() {
        let player = Player::new();
        let mut rx = player.subscribe();

        player.toggle_play_pause().await;
        player.seek_to(Duration::from_secs(10)).await;
        player.seek_forward(Duration::from_secs(5)).await;
        player.seek_back(Duration::from_secs(5)).await;
        player.set_volume(50).await;

        let state = player.snapshot().await;
        assert_eq!(state, PlaybackState::default());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_toggle_play_pause() {
        let (player, _track) = player_with_track().await;

        player.toggle_play_pause().await;
        assert!(player.is_playing().await);

        player.toggle_play_pause().await;
        assert!(!player.is_playing().await);
    }

    #[tokio::test]
    async fn test_seek_resolves_active_cue() {
        let (player, track) = player_with_track().await;

        player.seek_to(Duration::from_secs(15)).await;
        let state = player.snapshot().await;
        assert_eq!(state.active_cue, Some(1));
        assert_eq!(state.position, Duration::from_secs(15));
        assert_eq!(track.current_time(), Duration::from_secs(15));

        player.seek_to(Duration::from_secs(25)).await;
        assert_eq!(player.snapshot().await.active_cue, Some(2));
    }

    #[tokio::test]
    async fn test_seek_back_past_start_clamps_to_zero() {
        let (player, _track) = player_with_track().await;

        player.seek_to(Duration::from_secs(3)).await;
        player.seek_back(Duration::from_secs(5)).await;

        let state = player.snapshot().await;
        assert_eq!(state.position, Duration::ZERO);
        assert_eq!(state.active_cue, Some(0));
    }

    #[tokio::test]
    async fn test_seek_clamped_to_known_duration() {
        let (player, track) = player_with_track().await;
        player.on_metadata_loaded(Duration::from_secs(30)).await;

        player.seek_to(Duration::from_secs(90)).await;
        assert_eq!(player.snapshot().await.position, Duration::from_secs(30));
        assert_eq!(track.current_time(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_seek_unclamped_while_duration_unknown() {
        let (player, _track) = player_with_track().await;

        player.seek_to(Duration::from_secs(90)).await;
        assert_eq!(player.snapshot().await.position, Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_skip_to_end_requires_known_duration() {
        let (player, _track) = player_with_track().await;

        player.skip_to_end().await;
        assert_eq!(player.snapshot().await.position, Duration::ZERO);

        player.on_metadata_loaded(Duration::from_secs(60)).await;
        player.skip_to_end().await;
        assert_eq!(player.snapshot().await.position, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_skip_to_start() {
        let (player, _track) = player_with_track().await;

        player.seek_to(Duration::from_secs(15)).await;
        player.skip_to_start().await;

        let state = player.snapshot().await;
        assert_eq!(state.position, Duration::ZERO);
        assert_eq!(state.active_cue, Some(0));
    }

    #[tokio::test]
    async fn test_jump_to_cue() {
        let (player, _track) = player_with_track().await;

        let result = player.jump_to_cue(2).await;
        assert!(result.is_ok());
        assert_eq!(player.snapshot().await.position, Duration::from_secs(20));
        assert_eq!(player.snapshot().await.active_cue, Some(2));
    }

    #[tokio::test]
    async fn test_jump_to_missing_cue_is_an_error() {
        let (player, _track) = player_with_track().await;

        let result = player.jump_to_cue(99).await;
        assert!(matches!(
            result,
            Err(crate::CoreError::CueOutOfRange { index: 99, len: 3 })
        ));
    }

    #[tokio::test]
    async fn test_volume_clamped_high() {
        let (player, track) = player_with_track().await;

        player.set_volume(150).await;
        assert_eq!(player.snapshot().await.volume, 100);
        assert!((track.volume() - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_volume_clamped_low() {
        let (player, track) = player_with_track().await;

        player.set_volume(-10).await;
        assert_eq!(player.snapshot().await.volume, 0);
        assert!(track.volume().abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_volume_maps_to_normalized_domain() {
        let (player, track) = player_with_track().await;

        player.set_volume(40).await;
        assert_eq!(player.snapshot().await.volume, 40);
        assert!((track.volume() - 0.4).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_attach_applies_stored_volume() {
        let player = Player::new();
        let track = SimulatedTrack::new();
        track.set_volume(0.3);

        player.attach_resource(Box::new(track.clone())).await;
        assert!((track.volume() - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_track_ended_stops_playback_and_keeps_position() {
        let (player, _track) = player_with_track().await;

        player.seek_to(Duration::from_secs(25)).await;
        player.toggle_play_pause().await;
        assert!(player.is_playing().await);

        player.on_track_ended().await;

        let state = player.snapshot().await;
        assert!(!state.is_playing);
        assert_eq!(state.position, Duration::from_secs(25));
    }

    #[tokio::test]
    async fn test_seek_while_paused_publishes_cue_change() {
        let (player, _track) = player_with_track().await;
        let mut rx = player.subscribe();

        player.seek_to(Duration::from_secs(15)).await;

        let mut saw_cue_change = false;
        while let Ok(event) = rx.try_recv() {
            if let PlayerEvent::CueChanged { index } = event {
                assert_eq!(index, Some(1));
                saw_cue_change = true;
            }
        }
        assert!(saw_cue_change);
    }

    #[tokio::test]
    async fn test_load_cues_resets_active_index() {
        let (player, _track) = player_with_track().await;

        player.seek_to(Duration::from_secs(15)).await;
        assert_eq!(player.snapshot().await.active_cue, Some(1));

        player.load_cues(test_cues()).await;
        assert_eq!(player.snapshot().await.active_cue, None);
    }

    #[tokio::test]
    async fn test_tick_publishes_only_on_change() {
        let (player, _track) = player_with_track().await;
        let mut rx = player.subscribe();

        // Clock is paused and position already published: nothing changes
        player.publish_tick().await;
        player.publish_tick().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tick_after_external_position_change() {
        let (player, track) = player_with_track().await;
        let mut rx = player.subscribe();

        // Position moved under the engine (as a playing clock would)
        track.set_current_time(Duration::from_secs(12));
        player.publish_tick().await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(events
            .iter()
            .any(|e| matches!(e, PlayerEvent::CueChanged { index: Some(1) })));
        assert!(events.iter().any(
            |e| matches!(e, PlayerEvent::PositionChanged { position } if *position == Duration::from_secs(12))
        ));

        let state = player.snapshot().await;
        assert_eq!(state.active_cue, Some(1));
        assert_eq!(state.position, Duration::from_secs(12));
    }
}
