//! Types for the rendition ladder.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of each rendition's variant playlist.
pub const VARIANT_PLAYLIST_NAME: &str = "playlist.m3u8";

/// Errors raised when building a ladder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LadderError {
    /// A ladder needs at least one rendition.
    #[error("ladder must contain at least one rendition")]
    Empty,

    /// Heights must strictly ascend.
    #[error("ladder heights must ascend: {previous} is followed by {next}")]
    NotAscending { previous: u32, next: u32 },

    /// A rendition has a zero height or bitrate.
    #[error("rendition {label} has an invalid height or bitrate")]
    InvalidRendition { label: String },
}

/// One target rendition: a height, a video bitrate and a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    /// Position in the ladder.
    pub index: usize,
    /// Target frame height in pixels.
    pub height: u32,
    /// Target video bitrate in kbit/s.
    pub bitrate_kbps: u32,
    /// Display resolution, e.g. "1280x720".
    pub label: String,
}

impl RenditionSpec {
    pub fn new(index: usize, height: u32, bitrate_kbps: u32, label: impl Into<String>) -> Self {
        Self {
            index,
            height,
            bitrate_kbps,
            label: label.into(),
        }
    }

    /// Bandwidth advertised in the master manifest, in bits per second.
    pub fn bandwidth_bps(&self) -> u64 {
        u64::from(self.bitrate_kbps) * 1000
    }

    /// Directory holding this rendition's playlist and segments, relative to
    /// the job output directory.
    pub fn variant_dir(&self) -> String {
        format!("v{}", self.index)
    }

    /// Variant playlist path relative to the job output directory.
    pub fn variant_playlist(&self) -> String {
        format!("{}/{}", self.variant_dir(), VARIANT_PLAYLIST_NAME)
    }
}

/// An ordered, ascending sequence of renditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ladder {
    renditions: Vec<RenditionSpec>,
}

impl Ladder {
    /// Builds a ladder from `(height, bitrate_kbps, label)` steps.
    ///
    /// Indices are assigned by position.
    pub fn new<I, S>(steps: I) -> Result<Self, LadderError>
    where
        I: IntoIterator<Item = (u32, u32, S)>,
        S: Into<String>,
    {
        let renditions: Vec<RenditionSpec> = steps
            .into_iter()
            .enumerate()
            .map(|(index, (height, bitrate_kbps, label))| {
                RenditionSpec::new(index, height, bitrate_kbps, label)
            })
            .collect();

        if renditions.is_empty() {
            return Err(LadderError::Empty);
        }

        for rendition in &renditions {
            if rendition.height == 0 || rendition.bitrate_kbps == 0 {
                return Err(LadderError::InvalidRendition {
                    label: rendition.label.clone(),
                });
            }
        }

        for pair in renditions.windows(2) {
            if pair[1].height <= pair[0].height {
                return Err(LadderError::NotAscending {
                    previous: pair[0].height,
                    next: pair[1].height,
                });
            }
        }

        Ok(Self { renditions })
    }

    /// The reference ladder: 144p through 1440p.
    pub fn standard() -> Self {
        Self {
            renditions: vec![
                RenditionSpec::new(0, 144, 200, "256x144"),
                RenditionSpec::new(1, 240, 400, "426x240"),
                RenditionSpec::new(2, 360, 800, "640x360"),
                RenditionSpec::new(3, 480, 1200, "854x480"),
                RenditionSpec::new(4, 720, 2500, "1280x720"),
                RenditionSpec::new(5, 1080, 5000, "1920x1080"),
                RenditionSpec::new(6, 1440, 8000, "2560x1440"),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.renditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renditions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RenditionSpec> {
        self.renditions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenditionSpec> {
        self.renditions.iter()
    }

    pub fn as_slice(&self) -> &[RenditionSpec] {
        &self.renditions
    }
}

impl Default for Ladder {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'a> IntoIterator for &'a Ladder {
    type Item = &'a RenditionSpec;
    type IntoIter = std::slice::Iter<'a, RenditionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.renditions.iter()
    }
}
