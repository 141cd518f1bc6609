use cuesync_core::duration_from_secs;
use std::time::Duration;

/// A transport command entered on stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Toggle between playing and paused
    TogglePlayPause,
    /// Seek to an absolute position
    Seek(Duration),
    /// Seek forward by the configured step
    Forward,
    /// Seek backward by the configured step
    Rewind,
    /// Jump to the start of the track
    SkipToStart,
    /// Jump to the end of the track
    SkipToEnd,
    /// Set the volume in percent
    Volume(i32),
    /// Seek to the start of the cue at this index
    Jump(usize),
    /// Print the cue list
    List,
    /// Print the current playback state
    Status,
    /// Print command help
    Help,
    /// Quit the player
    Quit,
}

impl Command {
    /// Parse a line of user input. Returns `None` for anything
    /// unrecognized, including known commands with a bad argument.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let word = parts.next()?;
        let arg = parts.next();

        match word {
            "p" | "play" | "pause" => Some(Self::TogglePlayPause),
            "seek" => {
                let secs: f64 = arg?.parse().ok()?;
                duration_from_secs(secs).map(Self::Seek)
            }
            "f" | "fwd" | "forward" => Some(Self::Forward),
            "r" | "rew" | "rewind" => Some(Self::Rewind),
            "start" => Some(Self::SkipToStart),
            "end" => Some(Self::SkipToEnd),
            "vol" | "volume" => arg?.parse().ok().map(Self::Volume),
            "j" | "jump" => arg?.parse().ok().map(Self::Jump),
            "l" | "list" => Some(Self::List),
            "s" | "status" => Some(Self::Status),
            "h" | "help" | "?" => Some(Self::Help),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Usage text for the `help` command
pub const HELP_TEXT: &str = "\
Commands:
  p | play | pause     toggle play/pause
  seek <secs>          seek to an absolute position
  f | fwd              seek forward
  r | rew              seek backward
  start                jump to the start of the track
  end                  jump to the end of the track
  vol <0-100>          set the volume
  j | jump <index>     jump to a cue by index
  l | list             print the cue list
  s | status           print the playback state
  h | help             show this help
  q | quit             exit";
