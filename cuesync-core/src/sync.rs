//! The per-frame synchronization loop.
//!
//! While playback is running, the loop samples the media clock once per
//! frame and asks the player to publish whatever changed. While paused it
//! holds no timer at all: it parks on the player's event stream and wakes
//! only when a command might have resumed playback, so a paused player
//! costs no work and no resource reads.

use crate::player::Player;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default sync frequency, in frames per second
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// The recurring task keeping published state aligned with the media
/// clock.
///
/// Two states: *scheduled* (a frame tick is pending) while playing, and
/// *idle* (parked on the event stream) while paused. Cancellation is
/// immediate in both: a pending tick is abandoned, never fired late.
pub struct SyncLoop {
    player: Arc<Player>,
    frame_interval: Duration,
    cancel_token: CancellationToken,
}

impl SyncLoop {
    /// Create a new sync loop
    ///
    /// # Arguments
    /// * `player` - Player to drive
    /// * `frame_rate` - Ticks per second while playing (clamped to at least 1)
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    #[must_use]
    pub fn new(
        player: Arc<Player>,
        frame_rate: u32,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        let frame_interval = Duration::from_millis(1000 / u64::from(frame_rate.max(1)));
        Self {
            player,
            frame_interval,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Signal the loop to stop
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Start the loop in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the loop until cancelled
    pub async fn run(&self) {
        info!(
            "Starting sync loop (frame interval: {:?})",
            self.frame_interval
        );

        let mut rx = self.player.subscribe();

        loop {
            if self.player.is_playing().await {
                tokio::select! {
                    () = self.cancel_token.cancelled() => break,
                    () = tokio::time::sleep(self.frame_interval) => {
                        self.player.publish_tick().await;
                    }
                }
            } else {
                tokio::select! {
                    () = self.cancel_token.cancelled() => break,
                    event = rx.recv() => {
                        match event {
                            // Any event may mean playback resumed; loop
                            // around and re-check
                            Ok(_) => {}
                            Err(RecvError::Closed) => break,
                            Err(RecvError::Lagged(n)) => {
                                debug!("Missed {n} player events");
                            }
                        }
                    }
                }
            }
        }

        info!("Sync loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::{Cue, CueSheet};
    use crate::player::PlayerEvent;
    use crate::resource::{MediaResource, SimulatedTrack};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a [`SimulatedTrack`] and counts clock reads, to pin down
    /// exactly when the loop samples the resource.
    #[derive(Clone)]
    struct CountingTrack {
        inner: SimulatedTrack,
        reads: Arc<AtomicUsize>,
    }

    impl CountingTrack {
        fn new() -> Self {
            Self {
                inner: SimulatedTrack::new(),
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl MediaResource for CountingTrack {
        fn current_time(&self) -> Duration {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.current_time()
        }

        fn set_current_time(&self, position: Duration) {
            self.inner.set_current_time(position);
        }

        fn duration(&self) -> Option<Duration> {
            self.inner.duration()
        }

        fn volume(&self) -> f32 {
            self.inner.volume()
        }

        fn set_volume(&self, volume: f32) {
            self.inner.set_volume(volume);
        }

        fn play(&self) {
            self.inner.play();
        }

        fn pause(&self) {
            self.inner.pause();
        }
    }

    async fn setup() -> (Arc<Player>, CountingTrack, Arc<SyncLoop>) {
        let player = Player::new();
        let track = CountingTrack::new();
        player.attach_resource(Box::new(track.clone())).await;
        player
            .load_cues(CueSheet::new(vec![
                Cue::new("a", Duration::ZERO),
                Cue::new("b", Duration::from_secs(10)),
            ]))
            .await;
        let sync_loop = Arc::new(SyncLoop::new(player.clone(), DEFAULT_FRAME_RATE, None));
        (player, track, sync_loop)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_resource_reads_while_paused() {
        let (_player, track, sync_loop) = setup().await;
        let handle = sync_loop.clone().start();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(track.reads(), 0);

        sync_loop.stop();
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_while_playing() {
        let (player, track, sync_loop) = setup().await;
        let handle = sync_loop.clone().start();

        player.toggle_play_pause().await;
        let before = track.reads();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(track.reads() > before, "loop should sample every frame");

        sync_loop.stop();
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_publishes_cue_change_after_seek_behind_engine() {
        let (player, track, sync_loop) = setup().await;
        let mut rx = player.subscribe();
        let handle = sync_loop.clone().start();

        player.toggle_play_pause().await;

        // Move the clock without going through the controller; only the
        // next tick can notice this.
        track.set_current_time(Duration::from_secs(12));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut saw_cue_change = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, PlayerEvent::CueChanged { index: Some(1) }) {
                saw_cue_change = true;
            }
        }
        assert!(saw_cue_change);
        assert_eq!(player.snapshot().await.active_cue, Some(1));

        sync_loop.stop();
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_idles_the_loop() {
        let (player, track, sync_loop) = setup().await;
        let handle = sync_loop.clone().start();

        player.toggle_play_pause().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        player.toggle_play_pause().await;
        // At most the already-scheduled tick may still run
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_pause = track.reads();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(track.reads(), after_pause);

        sync_loop.stop();
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_restarts_ticks() {
        let (player, track, sync_loop) = setup().await;
        let handle = sync_loop.clone().start();

        player.toggle_play_pause().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        player.toggle_play_pause().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let while_paused = track.reads();
        player.toggle_play_pause().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(track.reads() > while_paused);

        sync_loop.stop();
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_all_reads() {
        let (player, track, sync_loop) = setup().await;
        let handle = sync_loop.clone().start();

        player.toggle_play_pause().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Cancel with a tick scheduled, then wait for the task to finish
        sync_loop.stop();
        let _ = handle.await;

        let after_teardown = track.reads();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(track.reads(), after_teardown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_track_goes_idle_until_resumed() {
        let (player, track, sync_loop) = setup().await;
        let handle = sync_loop.clone().start();

        player.on_metadata_loaded(Duration::from_secs(30)).await;
        player.toggle_play_pause().await;
        player.seek_to(Duration::from_secs(30)).await;

        // The driver reports the end; the loop should wind down
        player.on_track_ended().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_end = track.reads();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(track.reads(), after_end);
        assert!(!player.is_playing().await);

        sync_loop.stop();
        let _ = handle.await;
    }
}
