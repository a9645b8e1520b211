use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error that can be returned by the codec, configuration loading and pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A character outside the grapheme table was handed to transliteration.
    #[error("character {ch:?} in {word:?} is not part of the grapheme table")]
    InvalidGrapheme { ch: char, word: String },

    /// A phonetic string could not be mapped back to graphemes.
    #[error("cannot transcribe {input:?}: {reason}")]
    Transcription { input: String, reason: String },

    /// Missing or malformed table and rule list sources.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O errors.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Grapheme table parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Configuration manifest parsing errors.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Walkdir errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}
