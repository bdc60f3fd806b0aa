//! Types for the progress module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status of a single rendition within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenditionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

/// Live state of one rendition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionProgress {
    pub status: RenditionStatus,
    /// Latest observed value per progress field.
    pub metrics: BTreeMap<String, String>,
    /// Diagnostic text captured when the encoder failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The fixed set of progress fields the encoder reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressField {
    Frame,
    Fps,
    Size,
    Time,
    Bitrate,
    Speed,
}

impl ProgressField {
    pub const ALL: [ProgressField; 6] = [
        ProgressField::Frame,
        ProgressField::Fps,
        ProgressField::Size,
        ProgressField::Time,
        ProgressField::Bitrate,
        ProgressField::Speed,
    ];

    /// Name used as the metrics key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressField::Frame => "frame",
            ProgressField::Fps => "fps",
            ProgressField::Size => "size",
            ProgressField::Time => "time",
            ProgressField::Bitrate => "bitrate",
            ProgressField::Speed => "speed",
        }
    }

    /// Maps a key emitted by the encoder to a field.
    ///
    /// `-progress` output spells size and time as `total_size` and
    /// `out_time`; both spellings are accepted.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "frame" => Some(ProgressField::Frame),
            "fps" => Some(ProgressField::Fps),
            "size" | "total_size" => Some(ProgressField::Size),
            "time" | "out_time" => Some(ProgressField::Time),
            "bitrate" => Some(ProgressField::Bitrate),
            "speed" => Some(ProgressField::Speed),
            _ => None,
        }
    }
}

impl fmt::Display for ProgressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed progress value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub field: ProgressField,
    pub value: String,
}

impl ProgressEvent {
    pub fn new(field: ProgressField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Parses a single `key=value` line.
    ///
    /// Returns `None` for log output, unknown keys and empty values.
    pub fn parse(line: &str) -> Option<Self> {
        let (key, value) = line.trim().split_once('=')?;
        let field = ProgressField::from_key(key.trim())?;
        let value = value.trim();
        if value.is_empty() || value.contains(char::is_whitespace) {
            return None;
        }
        Some(Self::new(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_fields() {
        assert_eq!(
            ProgressEvent::parse("frame=120"),
            Some(ProgressEvent::new(ProgressField::Frame, "120"))
        );
        assert_eq!(
            ProgressEvent::parse("fps=29.97"),
            Some(ProgressEvent::new(ProgressField::Fps, "29.97"))
        );
        assert_eq!(
            ProgressEvent::parse("bitrate= 812.4kbits/s"),
            Some(ProgressEvent::new(ProgressField::Bitrate, "812.4kbits/s"))
        );
        assert_eq!(
            ProgressEvent::parse("speed=1.25x"),
            Some(ProgressEvent::new(ProgressField::Speed, "1.25x"))
        );
    }

    #[test]
    fn test_parse_progress_aliases() {
        assert_eq!(
            ProgressEvent::parse("total_size=1048576"),
            Some(ProgressEvent::new(ProgressField::Size, "1048576"))
        );
        assert_eq!(
            ProgressEvent::parse("out_time=00:00:04.000000"),
            Some(ProgressEvent::new(ProgressField::Time, "00:00:04.000000"))
        );
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        assert_eq!(ProgressEvent::parse("out_time_us=4000000"), None);
        assert_eq!(ProgressEvent::parse("progress=continue"), None);
        assert_eq!(ProgressEvent::parse("frame="), None);
        assert_eq!(
            ProgressEvent::parse("[libx264 @ 0x55] using cpu capabilities: MMX2"),
            None
        );
        assert_eq!(ProgressEvent::parse(""), None);
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in ProgressField::ALL {
            assert_eq!(ProgressField::from_key(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&RenditionStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
