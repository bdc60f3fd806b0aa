//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while encoding a rendition.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// CPU governor binary not found.
    #[error("CPU governor not found at path: {path}")]
    GovernorNotFound { path: PathBuf },

    /// Source file not found.
    #[error("Source file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Variant directory could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// The encode process exited with a non-zero status.
    #[error("Encode failed with exit code {code:?}: {diagnostic}")]
    EncodeFailed {
        code: Option<i32>,
        diagnostic: String,
    },

    /// I/O error while driving the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncoderError {
    pub fn encode_failed(code: Option<i32>, diagnostic: impl Into<String>) -> Self {
        Self::EncodeFailed {
            code,
            diagnostic: diagnostic.into(),
        }
    }

    /// Text recorded in the progress store when this error ends a rendition.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::EncodeFailed { diagnostic, .. } if !diagnostic.is_empty() => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}
