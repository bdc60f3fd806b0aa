//! Error types for the manifest module.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    /// Writing or swapping in the master manifest failed.
    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an existing manifest failed.
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest content is not a valid master playlist.
    #[error("Failed to parse manifest: {reason}")]
    Parse { reason: String },
}

impl ManifestError {
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}
