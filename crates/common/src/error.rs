//! Error types shared across Flipstage crates.

use std::path::PathBuf;

/// Top-level error type for Flipstage operations.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Unknown sequence: {name}")]
    UnknownSequence { name: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Playback error: {message}")]
    Playback { message: String },

    #[error("Card index {index} out of range (deck has {len} cards)")]
    CardOutOfRange { index: usize, len: usize },

    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StageError.
pub type StageResult<T> = Result<T, StageError>;

impl StageError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog {
            message: msg.into(),
        }
    }

    pub fn unknown_sequence(name: impl Into<String>) -> Self {
        Self::UnknownSequence { name: name.into() }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback {
            message: msg.into(),
        }
    }
}

/// Conditions that degrade a tick to "do nothing" instead of failing.
///
/// None of these are ever returned as `Err`. They travel inside outcome
/// values so callers and logs can tell why a tick produced no change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Degradation {
    /// A frame probe failed; this is how sequence length is discovered.
    #[error("sequence {sequence} ended at frame {frame}: {reason}")]
    ExpectedEnd {
        sequence: String,
        frame: u32,
        reason: String,
    },

    /// A sequence resolved to zero frames.
    #[error("sequence {sequence} has no frames")]
    EmptySequence { sequence: String },

    /// The tracked object has no usable extent this tick.
    #[error("bounding box is degenerate")]
    DegenerateGeometry,

    /// A one-shot completion arrived after it was already handled.
    #[error("duplicate completion for playback generation {generation}")]
    DoubleCompletion { generation: u64 },
}
