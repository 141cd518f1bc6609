use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Transcript errors
    #[error("Failed to parse transcription result: {0}")]
    TranscriptParse(#[from] serde_json::Error),

    // Cue errors
    #[error("Cue index {index} out of range (sheet has {len} cues)")]
    CueOutOfRange { index: usize, len: usize },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
