//! Master manifest model, rendering and parsing.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::error::ManifestError;
use crate::ladder::RenditionSpec;

const HEADER: &str = "#EXTM3U";
const VERSION_TAG: &str = "#EXT-X-VERSION:3";
const STREAM_INF: &str = "#EXT-X-STREAM-INF:";

/// One variant entry of a master manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantEntry {
    /// Advertised bandwidth in bits per second.
    pub bandwidth: u64,
    /// Resolution label, e.g. "640x360".
    pub resolution: String,
    /// Variant playlist URI relative to the master.
    pub uri: String,
}

impl From<&RenditionSpec> for VariantEntry {
    fn from(rendition: &RenditionSpec) -> Self {
        Self {
            bandwidth: rendition.bandwidth_bps(),
            resolution: rendition.label.clone(),
            uri: rendition.variant_playlist(),
        }
    }
}

/// An HLS master playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterManifest {
    pub variants: Vec<VariantEntry>,
}

impl MasterManifest {
    /// Builds the manifest for a completed prefix of the ladder.
    pub fn from_renditions(completed: &[RenditionSpec]) -> Self {
        Self {
            variants: completed.iter().map(VariantEntry::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}", HEADER);
        let _ = writeln!(out, "{}", VERSION_TAG);
        for variant in &self.variants {
            let _ = writeln!(
                out,
                "{}BANDWIDTH={},RESOLUTION={}",
                STREAM_INF, variant.bandwidth, variant.resolution
            );
            let _ = writeln!(out, "{}", variant.uri);
        }
        out
    }

    /// Parses master playlist text.
    ///
    /// Empty text yields an empty manifest, and a trailing `STREAM-INF` tag
    /// without its URI line is dropped: both are what a reader racing a
    /// writer can see, and the next read will be complete.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        match lines.next() {
            None => return Ok(Self::default()),
            Some(HEADER) => {}
            Some(other) => {
                return Err(ManifestError::parse(format!(
                    "expected {} header, found {:?}",
                    HEADER, other
                )))
            }
        }

        let mut variants = Vec::new();
        let mut pending: Option<(u64, String)> = None;

        for line in lines {
            if let Some(attributes) = line.strip_prefix(STREAM_INF) {
                pending = Some(parse_stream_inf(attributes)?);
            } else if line.starts_with('#') {
                continue;
            } else if let Some((bandwidth, resolution)) = pending.take() {
                variants.push(VariantEntry {
                    bandwidth,
                    resolution,
                    uri: line.to_string(),
                });
            } else {
                return Err(ManifestError::parse(format!(
                    "URI {:?} without a preceding stream tag",
                    line
                )));
            }
        }

        Ok(Self { variants })
    }
}

fn parse_stream_inf(attributes: &str) -> Result<(u64, String), ManifestError> {
    let mut bandwidth = None;
    let mut resolution = String::new();

    for attribute in attributes.split(',') {
        match attribute.split_once('=') {
            Some(("BANDWIDTH", value)) => {
                let parsed = value.parse::<u64>().map_err(|_| {
                    ManifestError::parse(format!("invalid BANDWIDTH value {:?}", value))
                })?;
                bandwidth = Some(parsed);
            }
            Some(("RESOLUTION", value)) => resolution = value.to_string(),
            _ => {}
        }
    }

    let bandwidth =
        bandwidth.ok_or_else(|| ManifestError::parse("stream tag without BANDWIDTH"))?;
    Ok((bandwidth, resolution))
}
