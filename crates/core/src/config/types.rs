use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::encoder::EncoderConfig;
use crate::ladder::{Ladder, LadderError};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub ladder: LadderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// Upload storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where sources are saved and HLS output directories are created.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Accepted source extensions, compared case-insensitively.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Largest accepted upload body in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            allowed_extensions: default_allowed_extensions(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_allowed_extensions() -> Vec<String> {
    ["mp4", "avi", "mov", "wmv", "mkv", "mts"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_upload_bytes() -> usize {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

/// One configured ladder step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenditionConfig {
    pub height: u32,
    pub bitrate_kbps: u32,
    pub label: String,
}

/// Rendition ladder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LadderConfig {
    #[serde(default = "default_renditions")]
    pub renditions: Vec<RenditionConfig>,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            renditions: default_renditions(),
        }
    }
}

fn default_renditions() -> Vec<RenditionConfig> {
    Ladder::standard()
        .iter()
        .map(|r| RenditionConfig {
            height: r.height,
            bitrate_kbps: r.bitrate_kbps,
            label: r.label.clone(),
        })
        .collect()
}

impl LadderConfig {
    /// Builds the validated ladder.
    pub fn to_ladder(&self) -> Result<Ladder, LadderError> {
        Ladder::new(
            self.renditions
                .iter()
                .map(|r| (r.height, r.bitrate_kbps, r.label.clone())),
        )
    }
}

/// Sanitized config for API responses (binary paths reduced to what matters)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
    pub encoder: SanitizedEncoderConfig,
    pub ladder: LadderConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub allowed_extensions: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEncoderConfig {
    pub cpu_limit_enabled: bool,
    pub cpu_share_percent: u32,
    pub segment_duration_secs: u32,
    pub preset: String,
    pub audio_bitrate_kbps: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                allowed_extensions: config.storage.allowed_extensions.clone(),
                max_upload_bytes: config.storage.max_upload_bytes,
            },
            encoder: SanitizedEncoderConfig {
                cpu_limit_enabled: config.encoder.cpu_limit_enabled,
                cpu_share_percent: config.encoder.cpu_share_percent,
                segment_duration_secs: config.encoder.segment_duration_secs,
                preset: config.encoder.preset.clone(),
                audio_bitrate_kbps: config.encoder.audio_bitrate_kbps,
            },
            ladder: config.ladder.clone(),
        }
    }
}
