//! Configuration for the encoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to the cpulimit binary used as CPU governor.
    #[serde(default = "default_cpulimit_path")]
    pub cpulimit_path: PathBuf,

    /// Whether encodes are wrapped by the CPU governor.
    #[serde(default = "default_true")]
    pub cpu_limit_enabled: bool,

    /// Share of total host CPU capacity an encode may use, in percent.
    #[serde(default = "default_cpu_share")]
    pub cpu_share_percent: u32,

    /// HLS segment duration in seconds.
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,

    /// x264 preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// AAC audio bitrate in kbps.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg arguments, inserted before the output path.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_cpulimit_path() -> PathBuf {
    PathBuf::from("cpulimit")
}

fn default_true() -> bool {
    true
}

fn default_cpu_share() -> u32 {
    50
}

fn default_segment_duration() -> u32 {
    2
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_audio_bitrate() -> u32 {
    128
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            cpulimit_path: default_cpulimit_path(),
            cpu_limit_enabled: true,
            cpu_share_percent: default_cpu_share(),
            segment_duration_secs: default_segment_duration(),
            preset: default_preset(),
            audio_bitrate_kbps: default_audio_bitrate(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl EncoderConfig {
    /// Creates a config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Disables the CPU governor; ffmpeg is spawned directly.
    pub fn without_cpu_limit(mut self) -> Self {
        self.cpu_limit_enabled = false;
        self
    }

    /// Sets the CPU share in percent of host capacity.
    pub fn with_cpu_share(mut self, percent: u32) -> Self {
        self.cpu_share_percent = percent;
        self
    }

    /// Sets the segment duration in seconds.
    pub fn with_segment_duration(mut self, secs: u32) -> Self {
        self.segment_duration_secs = secs;
        self
    }
}
