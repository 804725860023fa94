//! Error types for tubelens.

use thiserror::Error;

/// Library-level error type for tubelens operations.
///
/// Each pipeline stage fails with its own variant so that callers (CLI, HTTP
/// API) can surface a stage-qualified message instead of a silently degraded
/// result.
#[derive(Error, Debug)]
pub enum TubelensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid video locator: {0}")]
    InvalidLocator(String),

    #[error("Transcript acquisition failed: {0}")]
    Acquisition(String),

    #[error("Transcript is empty or unusable for video {0}")]
    EmptyTranscript(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Embedding computation failed: {0}")]
    Embedding(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Sentiment classification failed: {0}")]
    Classification(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("No vector index found for video {0}")]
    IndexNotFound(String),

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for tubelens operations.
pub type Result<T> = std::result::Result<T, TubelensError>;
