//! Loader for audio transcription results.
//!
//! The transcription collaborator delivers its output as JSON: a list of
//! chunks, each a text fragment with a `[start, end]` timestamp pair in
//! seconds (the end of the final chunk may be `null`). This crate
//! deserializes that payload - either bare or wrapped in the webhook
//! body the service posts - and converts it into a [`CueSheet`] for the
//! engine. The payload is treated as pre-computed, immutable input;
//! nothing here talks to the transcription service itself.

use cuesync_core::{duration_from_secs, Cue, CueSheet, Result};
use serde::Deserialize;
use tracing::{debug, warn};

/// A single transcribed fragment with timing
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionChunk {
    /// Transcribed text
    pub text: String,
    /// Start and optional end, in seconds from the start of the track
    pub timestamp: (f64, Option<f64>),
}

/// A complete transcription result
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionResult {
    /// Timed fragments in transcription order
    pub chunks: Vec<TranscriptionChunk>,
}

/// The webhook body the transcription service posts on completion.
/// Only the `output` field matters here; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionWebhook {
    pub output: TranscriptionResult,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Webhook(TranscriptionWebhook),
    Result(TranscriptionResult),
}

impl TranscriptionResult {
    /// Convert the transcription into a cue sheet.
    ///
    /// Chunks with a non-finite or negative start time are dropped with
    /// a warning, as are chunks whose text is empty after trimming; a
    /// bad fragment should not take the whole transcript down. Input
    /// order is preserved for equal start times.
    #[must_use]
    pub fn into_cue_sheet(self) -> CueSheet {
        let total = self.chunks.len();
        let mut cues = Vec::with_capacity(total);

        for chunk in self.chunks {
            let Some(start) = duration_from_secs(chunk.timestamp.0) else {
                warn!(
                    "Dropping chunk with invalid start time {}: {:?}",
                    chunk.timestamp.0, chunk.text
                );
                continue;
            };

            let text = chunk.text.trim();
            if text.is_empty() {
                debug!("Dropping empty chunk at {start:?}");
                continue;
            }

            let mut cue = Cue::new(text, start);
            if let Some(end) = chunk.timestamp.1.and_then(duration_from_secs) {
                cue = cue.with_end(end);
            }
            cues.push(cue);
        }

        if cues.len() < total {
            warn!("Kept {} of {} transcription chunks", cues.len(), total);
        }

        CueSheet::new(cues)
    }
}

/// Parse a transcription payload into a cue sheet.
///
/// Accepts either the bare result (`{"chunks": [...]}`) or the full
/// webhook body (`{"output": {"chunks": [...]}}`).
///
/// # Errors
///
/// Returns [`CoreError::TranscriptParse`](cuesync_core::CoreError::TranscriptParse)
/// if the JSON does not match either shape.
pub fn parse_transcription(json: &str) -> Result<CueSheet> {
    let payload: Payload = serde_json::from_str(json)?;
    let result = match payload {
        Payload::Webhook(webhook) => webhook.output,
        Payload::Result(result) => result,
    };
    Ok(result.into_cue_sheet())
}
