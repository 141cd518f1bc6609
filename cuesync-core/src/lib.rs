//! Core engine for synchronized cue playback.
//!
//! Keeps a sheet of timestamped text cues (transcribed lyrics) aligned
//! with an advancing media clock, and exposes the transport surface a
//! front-end needs: play/pause, absolute and relative seeking, jump to
//! cue, and volume. State flows one way: commands go through the
//! [`Player`], the [`SyncLoop`] samples the clock once per frame while
//! playing, and observers receive [`PlayerEvent`]s only when something
//! actually changed.

pub mod config;
pub mod cue;
pub mod error;
pub mod paths;
pub mod playback;
pub mod player;
pub mod resource;
pub mod sync;
pub mod time;

pub use config::{CuesyncConfig, PlaybackConfig, SyncConfig};
pub use cue::{Cue, CueSheet};
pub use error::{CoreError, Result};
pub use paths::{config_dir, config_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playback::{PlaybackState, DEFAULT_VOLUME};
pub use player::{Player, PlayerEvent};
pub use resource::{MediaResource, SimulatedTrack};
pub use sync::{SyncLoop, DEFAULT_FRAME_RATE};
pub use time::{duration_from_secs, format_time};
