use crate::error::{CoreError, Result};
use std::time::Duration;

/// A single timed text cue (one lyric line) on the media timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// The cue text
    pub text: String,
    /// When this cue becomes active
    pub start: Duration,
    /// When this cue ends, if the transcript provided one.
    /// Stored for display purposes only; resolution is driven by `start`.
    pub end: Option<Duration>,
}

impl Cue {
    /// Create a new cue
    pub fn new(text: impl Into<String>, start: Duration) -> Self {
        Self {
            text: text.into(),
            start,
            end: None,
        }
    }

    /// Set the end time
    #[must_use]
    pub const fn with_end(mut self, end: Duration) -> Self {
        self.end = Some(end);
        self
    }
}

/// An immutable, ordered sequence of cues.
///
/// Construction sorts cues ascending by start time. The sort is stable, so
/// cues sharing a start time keep their input order and the later-indexed
/// one wins resolution.
#[derive(Debug, Clone, Default)]
pub struct CueSheet {
    cues: Vec<Cue>,
}

impl CueSheet {
    /// Create a cue sheet from a list of cues, sorting by start time.
    #[must_use]
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by_key(|c| c.start);
        Self { cues }
    }

    /// Number of cues in the sheet
    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the sheet holds no cues
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Get a cue by index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CueOutOfRange`] if `index` is past the end.
    pub fn get(&self, index: usize) -> Result<&Cue> {
        self.cues.get(index).ok_or(CoreError::CueOutOfRange {
            index,
            len: self.cues.len(),
        })
    }

    /// Iterate over the cues in timeline order
    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    /// Find the active cue for a playback position: the last cue whose
    /// start time is at or before `position`.
    ///
    /// Returns `None` when the position precedes the first cue or the
    /// sheet is empty; positions past the last cue resolve to the last
    /// index. Because the sheet is sorted this is a binary search, and
    /// `partition_point` lands past equal start times so the last cue of
    /// a tie wins.
    #[must_use]
    pub fn active_index(&self, position: Duration) -> Option<usize> {
        let count = self.cues.partition_point(|c| c.start <= position);
        count.checked_sub(1)
    }
}
