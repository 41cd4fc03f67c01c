//! Error types for ytmoments.

use thiserror::Error;

/// Library-level error type for ytmoments operations.
///
/// Most pipeline failures are not errors at all: a missing transcript or an
/// empty comment list ends a run with a status event. These variants cover
/// the failures that do escape, mostly setup and storage.
#[derive(Error, Debug)]
pub enum MomentsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Comment source error: {0}")]
    Comments(String),

    #[error("Language model error: {0}")]
    Model(String),

    #[error("Cache error: {0}")]
    Cache(String),

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

/// Result type alias for ytmoments operations.
pub type Result<T> = std::result::Result<T, MomentsError>;
