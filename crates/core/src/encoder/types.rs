//! Types for the encoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ladder::RenditionSpec;

/// One rendition to encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeRequest {
    /// Owning job id.
    pub job_id: String,
    /// Uploaded source video.
    pub source_path: PathBuf,
    /// Job output directory; the variant lands in `v<index>/` below it.
    pub output_dir: PathBuf,
    /// Target rendition.
    pub rendition: RenditionSpec,
}

impl EncodeRequest {
    /// Directory holding this rendition's playlist and segments.
    pub fn variant_dir(&self) -> PathBuf {
        self.output_dir.join(self.rendition.variant_dir())
    }

    pub fn playlist_path(&self) -> PathBuf {
        self.output_dir.join(self.rendition.variant_playlist())
    }

    /// Segment file pattern handed to the HLS muxer.
    pub fn segment_pattern(&self) -> PathBuf {
        self.variant_dir().join("segment%d.ts")
    }
}

/// Result of a successful rendition encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeOutput {
    pub rendition: RenditionSpec,
    /// Written variant playlist.
    pub playlist_path: PathBuf,
    /// Wall-clock encode time in milliseconds.
    pub duration_ms: u64,
}
