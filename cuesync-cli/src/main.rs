mod commands;

use crate::commands::{Command, HELP_TEXT};
use clap::Parser;
use cuesync_core::{
    duration_from_secs, format_time, CuesyncConfig, Player, PlayerEvent, SimulatedTrack, SyncLoop,
};
use cuesync_transcript::parse_transcription;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Play a transcribed track in the terminal, keeping the lyric lines in
/// sync with a simulated playback clock.
#[derive(Debug, Parser)]
#[command(name = "cuesync", version, about)]
struct Args {
    /// Path to a transcription result JSON file
    transcript: PathBuf,

    /// Track length in seconds. When omitted the duration stays unknown:
    /// the seek bar has no end and the track never finishes on its own.
    #[arg(long)]
    duration: Option<f64>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Args::parse();

    let config = match CuesyncConfig::load_or_init() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let json = match std::fs::read_to_string(&args.transcript) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to read {}: {e}", args.transcript.display());
            std::process::exit(1);
        }
    };

    let cues = match parse_transcription(&json) {
        Ok(cues) => cues,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    if cues.is_empty() {
        warn!("Transcript contains no cues; nothing will be highlighted");
    }

    let duration = match (args.duration, args.duration.and_then(duration_from_secs)) {
        (Some(raw), None) => {
            warn!("Ignoring invalid --duration {raw}; treating the track length as unknown");
            None
        }
        (_, duration) => duration,
    };

    let track = match duration {
        Some(duration) => SimulatedTrack::with_duration(duration),
        None => SimulatedTrack::new(),
    };

    let player = Player::new();
    player.attach_resource(Box::new(track.clone())).await;
    if let Some(duration) = duration {
        player.on_metadata_loaded(duration).await;
    }
    player.set_volume(config.playback.default_volume).await;
    player.load_cues(cues).await;

    // Shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {e}");
    }

    let sync_loop = Arc::new(SyncLoop::new(
        player.clone(),
        config.sync.frame_rate,
        Some(cancel_token.clone()),
    ));
    let sync_handle = sync_loop.start();

    let display_handle = tokio::spawn(display_events(
        player.clone(),
        track.clone(),
        cancel_token.clone(),
    ));

    print_cue_list(&player).await;
    println!("{HELP_TEXT}");

    let seek_step = duration_from_secs(config.playback.seek_step_secs)
        .unwrap_or_else(|| Duration::from_secs(5));
    run_command_loop(&player, seek_step, &cancel_token).await;

    // Teardown order matters: stop the sync loop and wait for it before
    // the media resource goes away with this scope.
    cancel_token.cancel();
    let _ = sync_handle.await;
    let _ = display_handle.await;
    info!("Player shut down");
}

/// Read transport commands from stdin until quit, EOF, or cancellation
async fn run_command_loop(player: &Player, seek_step: Duration, cancel_token: &CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            // EOF: the driver went away
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read command: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Some(Command::TogglePlayPause) => player.toggle_play_pause().await,
            Some(Command::Seek(position)) => player.seek_to(position).await,
            Some(Command::Forward) => player.seek_forward(seek_step).await,
            Some(Command::Rewind) => player.seek_back(seek_step).await,
            Some(Command::SkipToStart) => player.skip_to_start().await,
            Some(Command::SkipToEnd) => player.skip_to_end().await,
            Some(Command::Volume(volume)) => player.set_volume(volume).await,
            Some(Command::Jump(index)) => {
                if let Err(e) = player.jump_to_cue(index).await {
                    warn!("{e}");
                }
            }
            Some(Command::List) => print_cue_list(player).await,
            Some(Command::Status) => print_status(player).await,
            Some(Command::Help) => println!("{HELP_TEXT}"),
            Some(Command::Quit) => break,
            None => println!("Unknown command: {line} (type 'help')"),
        }
    }
}

/// Print player events as they arrive and watch for the end of the
/// track. This is the stand-in for a media element's `ended` callback:
/// when the simulated clock runs out, report it to the player.
async fn display_events(player: Arc<Player>, track: SimulatedTrack, cancel_token: CancellationToken) {
    let mut rx = player.subscribe();
    let mut cues = player.cues().await;

    loop {
        let event = tokio::select! {
            () = cancel_token.cancelled() => break,
            event = rx.recv() => event,
        };

        match event {
            Ok(PlayerEvent::CueChanged { index }) => {
                if let Some(text) = index.and_then(|i| cues.get(i).ok().map(|c| c.text.clone())) {
                    println!("\n> {text}");
                }
            }
            Ok(PlayerEvent::PositionChanged { position }) => {
                print_position(&player, position).await;
                if track.has_ended() && player.is_playing().await {
                    player.on_track_ended().await;
                }
            }
            Ok(PlayerEvent::CuesLoaded { count }) => {
                info!("Cue sheet replaced ({count} cues)");
                cues = player.cues().await;
            }
            Ok(PlayerEvent::Playing { position }) => {
                info!("Playing from {}", format_time(Some(position)));
            }
            Ok(PlayerEvent::Paused { position }) => {
                info!("Paused at {}", format_time(Some(position)));
            }
            Ok(PlayerEvent::Seeked { position }) => {
                info!("Seeked to {}", format_time(Some(position)));
            }
            Ok(PlayerEvent::VolumeChanged { volume }) => {
                info!("Volume set to {volume}%");
            }
            Ok(PlayerEvent::MetadataLoaded { duration }) => {
                info!("Track duration: {}", format_time(Some(duration)));
            }
            Ok(PlayerEvent::TrackEnded { position }) => {
                info!("Track ended at {}", format_time(Some(position)));
            }
            Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(n)) => {
                debug!("Missed {n} player events");
            }
        }
    }
}

/// Rewrite the in-place position readout (the seek bar analog)
async fn print_position(player: &Player, position: Duration) {
    let state = player.snapshot().await;
    print!(
        "\r{} / {}",
        format_time(Some(position)),
        format_time(state.duration)
    );
    let _ = std::io::stdout().flush();
}

async fn print_cue_list(player: &Player) {
    let cues = player.cues().await;
    if cues.is_empty() {
        println!("(no cues)");
        return;
    }
    for (i, cue) in cues.iter().enumerate() {
        println!("{i:>3}  {}  {}", format_time(Some(cue.start)), cue.text);
    }
}

async fn print_status(player: &Player) {
    let state = player.snapshot().await;
    let mode = if state.is_playing { "playing" } else { "paused" };
    println!(
        "{} / {}  vol {}%  {mode}",
        format_time(Some(state.position)),
        format_time(state.duration),
        state.volume,
    );
}

/// Initialize tracing with console output
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
