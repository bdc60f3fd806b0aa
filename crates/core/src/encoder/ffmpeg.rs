//! FFmpeg-based rendition encoder.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::config::EncoderConfig;
use super::cpu::CpuBudget;
use super::error::EncoderError;
use super::traits::RenditionEncoder;
use super::types::{EncodeOutput, EncodeRequest};
use crate::progress::{ProgressEvent, RenditionTracker};

/// FFmpeg-based encoder, optionally wrapped by a CPU governor.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Builds ffmpeg arguments for one HLS variant.
    fn build_ffmpeg_args(&self, request: &EncodeRequest) -> Vec<String> {
        let rendition = &request.rendition;

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            request.source_path.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
        ];

        // Scale to target height, width follows aspect ratio rounded to even
        args.extend([
            "-vf".to_string(),
            format!("scale=-2:{}", rendition.height),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-b:v".to_string(),
            format!("{}k", rendition.bitrate_kbps),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
        ]);

        // HLS segmentation
        args.extend([
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            self.config.segment_duration_secs.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_segment_filename".to_string(),
            request.segment_pattern().to_string_lossy().to_string(),
        ]);

        // Log level and machine-readable progress on stderr
        args.extend([
            "-nostats".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(request.playlist_path().to_string_lossy().to_string());

        args
    }

    /// Returns the program to spawn and its arguments, wrapping ffmpeg in the
    /// CPU governor when enabled.
    fn build_command(&self, request: &EncodeRequest, budget: CpuBudget) -> (PathBuf, Vec<String>) {
        let ffmpeg_args = self.build_ffmpeg_args(request);

        if !self.config.cpu_limit_enabled {
            return (self.config.ffmpeg_path.clone(), ffmpeg_args);
        }

        let mut args = vec![
            "--limit".to_string(),
            budget.limit_percent().to_string(),
            "--".to_string(),
            self.config.ffmpeg_path.to_string_lossy().to_string(),
        ];
        args.extend(ffmpeg_args);

        (self.config.cpulimit_path.clone(), args)
    }

    fn not_found_error(&self) -> EncoderError {
        if self.config.cpu_limit_enabled {
            EncoderError::GovernorNotFound {
                path: self.config.cpulimit_path.clone(),
            }
        } else {
            EncoderError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        }
    }

    /// Runs one encode to completion. The tracker is only marked completed
    /// after the process has exited with status 0.
    async fn run_encode(
        &self,
        request: &EncodeRequest,
        tracker: &RenditionTracker,
    ) -> Result<EncodeOutput, EncoderError> {
        let start = Instant::now();

        if !request.source_path.exists() {
            return Err(EncoderError::InputNotFound {
                path: request.source_path.clone(),
            });
        }

        let variant_dir = request.variant_dir();
        tokio::fs::create_dir_all(&variant_dir)
            .await
            .map_err(|_| EncoderError::OutputDirectoryFailed {
                path: variant_dir.clone(),
            })?;

        let budget = CpuBudget::from_host(self.config.cpu_share_percent);
        let (program, args) = self.build_command(request, budget);

        debug!(
            job_id = %request.job_id,
            height = request.rendition.height,
            program = %program.display(),
            cpu_limit = budget.limit_percent(),
            "Spawning encoder"
        );

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    self.not_found_error()
                } else {
                    EncoderError::Io(e)
                }
            })?;

        tracker.start().await;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("encoder stderr was not captured"))?;
        let mut reader = BufReader::new(stderr);

        // Metadata echoed on stderr is not guaranteed to be UTF-8
        let mut buf = Vec::new();
        let mut diagnostic = String::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let raw = String::from_utf8_lossy(&buf);
            let line = raw.trim_end_matches(['\n', '\r']);
            if let Some(event) = ProgressEvent::parse(line) {
                tracker.record(&event).await;
            } else if !is_progress_block_line(line) && !line.trim().is_empty() {
                diagnostic.push_str(line);
                diagnostic.push('\n');
            }
        }

        // Stream closed; now wait for the exit status
        let status = child.wait().await?;

        if !status.success() {
            let diagnostic = diagnostic.trim_end().to_string();
            warn!(
                job_id = %request.job_id,
                height = request.rendition.height,
                code = ?status.code(),
                "Encoder exited with failure"
            );
            return Err(EncoderError::encode_failed(status.code(), diagnostic));
        }

        tracker.complete().await;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            job_id = %request.job_id,
            height = request.rendition.height,
            duration_ms,
            "Rendition encoded"
        );

        Ok(EncodeOutput {
            rendition: request.rendition.clone(),
            playlist_path: request.playlist_path(),
            duration_ms,
        })
    }
}

/// True for the bookkeeping lines of an ffmpeg `-progress` block
/// (`out_time_us=...`, `progress=continue`, `dup_frames=0`, ...).
fn is_progress_block_line(line: &str) -> bool {
    match line.split_once('=') {
        Some((key, _)) => {
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

#[async_trait]
impl RenditionEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode(
        &self,
        request: EncodeRequest,
        tracker: RenditionTracker,
    ) -> Result<EncodeOutput, EncoderError> {
        match self.run_encode(&request, &tracker).await {
            Ok(output) => Ok(output),
            Err(e) => {
                tracker.fail(e.diagnostic()).await;
                Err(e)
            }
        }
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        // Check ffmpeg exists
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EncoderError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(EncoderError::Io(e));
        }

        // Check the governor exists
        if self.config.cpu_limit_enabled {
            let governor_result = Command::new(&self.config.cpulimit_path)
                .arg("--help")
                .output()
                .await;

            if let Err(e) = governor_result {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(EncoderError::GovernorNotFound {
                        path: self.config.cpulimit_path.clone(),
                    });
                }
                return Err(EncoderError::Io(e));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::RenditionSpec;
    use crate::progress::{ProgressStore, RenditionStatus};
    use std::sync::Arc;

    fn request_720p() -> EncodeRequest {
        EncodeRequest {
            job_id: "movie.mp4".to_string(),
            source_path: PathBuf::from("/uploads/movie.mp4"),
            output_dir: PathBuf::from("/uploads/hls_movie"),
            rendition: RenditionSpec::new(4, 720, 2500, "1280x720"),
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    #[test]
    fn test_build_ffmpeg_args() {
        let encoder = FfmpegEncoder::with_defaults();
        let args = encoder.build_ffmpeg_args(&request_720p());

        assert_eq!(value_after(&args, "-i"), Some("/uploads/movie.mp4"));
        assert_eq!(value_after(&args, "-vf"), Some("scale=-2:720"));
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-b:v"), Some("2500k"));
        assert_eq!(value_after(&args, "-c:a"), Some("aac"));
        assert_eq!(value_after(&args, "-f"), Some("hls"));
        assert_eq!(value_after(&args, "-hls_time"), Some("2"));
        assert_eq!(value_after(&args, "-hls_list_size"), Some("0"));
        assert_eq!(
            value_after(&args, "-hls_segment_filename"),
            Some("/uploads/hls_movie/v4/segment%d.ts")
        );
        assert_eq!(value_after(&args, "-progress"), Some("pipe:2"));
        assert_eq!(
            args.last().map(|s| s.as_str()),
            Some("/uploads/hls_movie/v4/playlist.m3u8")
        );
    }

    #[test]
    fn test_build_command_wraps_in_governor() {
        let encoder = FfmpegEncoder::with_defaults();
        let (program, args) = encoder.build_command(&request_720p(), CpuBudget::new(8, 50));

        assert_eq!(program, PathBuf::from("cpulimit"));
        assert_eq!(&args[..4], ["--limit", "400", "--", "ffmpeg"]);
        assert_eq!(value_after(&args, "-vf"), Some("scale=-2:720"));
    }

    #[test]
    fn test_build_command_without_governor() {
        let encoder = FfmpegEncoder::new(EncoderConfig::default().without_cpu_limit());
        let (program, args) = encoder.build_command(&request_720p(), CpuBudget::new(8, 50));

        assert_eq!(program, PathBuf::from("ffmpeg"));
        assert_eq!(args[0], "-y");
        assert!(!args.contains(&"--limit".to_string()));
    }

    #[test]
    fn test_custom_segment_duration_and_extra_args() {
        let mut config = EncoderConfig::default().with_segment_duration(6);
        config.extra_ffmpeg_args = vec!["-threads".to_string(), "2".to_string()];
        let encoder = FfmpegEncoder::new(config);
        let args = encoder.build_ffmpeg_args(&request_720p());

        assert_eq!(value_after(&args, "-hls_time"), Some("6"));
        assert_eq!(value_after(&args, "-threads"), Some("2"));
        assert!(args.last().unwrap().ends_with("playlist.m3u8"));
    }

    #[test]
    fn test_is_progress_block_line() {
        assert!(is_progress_block_line("out_time_us=4000000"));
        assert!(is_progress_block_line("progress=continue"));
        assert!(is_progress_block_line("stream_0_0_q=28.0"));
        assert!(!is_progress_block_line(
            "[hls @ 0x5581] Opening 'v0/segment0.ts' for writing"
        ));
        assert!(!is_progress_block_line("Error opening input: No such file"));
        assert!(!is_progress_block_line("=broken"));
    }

    #[tokio::test]
    async fn test_missing_input_marks_error() {
        let encoder = FfmpegEncoder::new(EncoderConfig::default().without_cpu_limit());
        let store = Arc::new(ProgressStore::new());
        let request = EncodeRequest {
            source_path: PathBuf::from("/nonexistent/source.mp4"),
            ..request_720p()
        };

        let result = encoder
            .encode(request, store.tracker("movie.mp4", 720))
            .await;

        assert!(matches!(result, Err(EncoderError::InputNotFound { .. })));
        let snapshot = store.snapshot("movie.mp4").await;
        assert_eq!(snapshot[&720].status, RenditionStatus::Error);
        assert!(snapshot[&720]
            .error
            .as_deref()
            .unwrap()
            .contains("/nonexistent/source.mp4"));
    }
}
