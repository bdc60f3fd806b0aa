//! FFmpeg encoder integration tests.
//!
//! A shell script stands in for ffmpeg: it prints `-progress` style output on
//! stderr, writes the playlist named by its last argument and exits with a
//! scripted code. This exercises the real process plumbing without needing a
//! media toolchain.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use hlsladder_core::{
    EncodeRequest, EncoderConfig, EncoderError, FfmpegEncoder, Ladder, ProgressStore,
    RenditionEncoder, RenditionStatus,
};

const SUCCEEDING_FFMPEG: &str = r#"#!/bin/sh
for last; do :; done
echo "ffmpeg version n7.0 Copyright (c) 2000-2024 the FFmpeg developers" >&2
echo "frame=12" >&2
echo "fps=24.0" >&2
echo "out_time=00:00:00.500000" >&2
echo "progress=continue" >&2
echo "frame=48" >&2
echo "fps=31.5" >&2
echo "total_size=262144" >&2
echo "bitrate= 419.4kbits/s" >&2
echo "out_time=00:00:02.000000" >&2
echo "speed=1.31x" >&2
echo "progress=end" >&2
mkdir -p "$(dirname "$last")"
printf '#EXTM3U\n#EXT-X-ENDLIST\n' > "$last"
exit 0
"#;

const FAILING_FFMPEG: &str = r#"#!/bin/sh
echo "frame=3" >&2
echo "progress=continue" >&2
echo "[mov,mp4,m4a,3gp,3g2,mj2 @ 0x55d0] moov atom not found" >&2
echo "uploads/broken.mp4: Invalid data found when processing input" >&2
exit 1
"#;

const LATIN1_METADATA_FFMPEG: &str = r#"#!/bin/sh
for last; do :; done
printf '    title           : caf\351\n' >&2
echo "frame=5" >&2
echo "progress=end" >&2
mkdir -p "$(dirname "$last")"
printf '#EXTM3U\n#EXT-X-ENDLIST\n' > "$last"
exit 0
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn request(dir: &TempDir, filename: &str) -> EncodeRequest {
    let source_path = dir.path().join(filename);
    std::fs::write(&source_path, b"not really a video").unwrap();
    EncodeRequest {
        job_id: filename.to_string(),
        source_path,
        output_dir: dir.path().join("hls_clip"),
        rendition: Ladder::standard().get(1).unwrap().clone(),
    }
}

#[tokio::test]
async fn test_successful_process_streams_progress() {
    let dir = TempDir::new().unwrap();
    let ffmpeg = write_script(dir.path(), "fake-ffmpeg-ok", SUCCEEDING_FFMPEG);
    let encoder = FfmpegEncoder::new(EncoderConfig::with_ffmpeg_path(ffmpeg).without_cpu_limit());
    let store = Arc::new(ProgressStore::new());

    let output = encoder
        .encode(request(&dir, "clip.mp4"), store.tracker("clip.mp4", 240))
        .await
        .unwrap();

    assert_eq!(
        output.playlist_path,
        dir.path().join("hls_clip/v1/playlist.m3u8")
    );
    assert!(output.playlist_path.exists());

    let snapshot = store.snapshot("clip.mp4").await;
    let progress = &snapshot[&240];
    assert_eq!(progress.status, RenditionStatus::Completed);
    // Latest value per field, never accumulated
    assert_eq!(progress.metrics["frame"], "48");
    assert_eq!(progress.metrics["fps"], "31.5");
    assert_eq!(progress.metrics["size"], "262144");
    assert_eq!(progress.metrics["bitrate"], "419.4kbits/s");
    assert_eq!(progress.metrics["time"], "00:00:02.000000");
    assert_eq!(progress.metrics["speed"], "1.31x");
    assert!(progress.error.is_none());
}

#[tokio::test]
async fn test_non_utf8_stderr_does_not_fail_encode() {
    let dir = TempDir::new().unwrap();
    let ffmpeg = write_script(dir.path(), "fake-ffmpeg-latin1", LATIN1_METADATA_FFMPEG);
    let encoder = FfmpegEncoder::new(EncoderConfig::with_ffmpeg_path(ffmpeg).without_cpu_limit());
    let store = Arc::new(ProgressStore::new());

    let output = encoder
        .encode(request(&dir, "clip.mp4"), store.tracker("clip.mp4", 240))
        .await
        .unwrap();
    assert!(output.playlist_path.exists());

    let snapshot = store.snapshot("clip.mp4").await;
    assert_eq!(snapshot[&240].status, RenditionStatus::Completed);
    assert_eq!(snapshot[&240].metrics["frame"], "5");
}

#[tokio::test]
async fn test_failing_process_records_diagnostic() {
    let dir = TempDir::new().unwrap();
    let ffmpeg = write_script(dir.path(), "fake-ffmpeg-fail", FAILING_FFMPEG);
    let encoder = FfmpegEncoder::new(EncoderConfig::with_ffmpeg_path(ffmpeg).without_cpu_limit());
    let store = Arc::new(ProgressStore::new());

    let err = encoder
        .encode(request(&dir, "broken.mp4"), store.tracker("broken.mp4", 240))
        .await
        .unwrap_err();

    match &err {
        EncoderError::EncodeFailed { code, diagnostic } => {
            assert_eq!(*code, Some(1));
            assert!(diagnostic.contains("moov atom not found"));
            assert!(!diagnostic.contains("progress=continue"));
        }
        other => panic!("expected EncodeFailed, got {:?}", other),
    }

    let snapshot = store.snapshot("broken.mp4").await;
    let progress = &snapshot[&240];
    assert_eq!(progress.status, RenditionStatus::Error);
    assert_eq!(progress.metrics["frame"], "3");
    assert!(progress
        .error
        .as_deref()
        .unwrap()
        .contains("Invalid data found when processing input"));
}

#[tokio::test]
async fn test_missing_binary_is_reported() {
    let dir = TempDir::new().unwrap();
    let encoder = FfmpegEncoder::new(
        EncoderConfig::with_ffmpeg_path(dir.path().join("no-such-ffmpeg")).without_cpu_limit(),
    );

    assert!(matches!(
        encoder.validate().await,
        Err(EncoderError::FfmpegNotFound { .. })
    ));

    let store = Arc::new(ProgressStore::new());
    let err = encoder
        .encode(request(&dir, "clip.mp4"), store.tracker("clip.mp4", 240))
        .await
        .unwrap_err();
    assert!(matches!(err, EncoderError::FfmpegNotFound { .. }));
    assert_eq!(
        store.snapshot("clip.mp4").await[&240].status,
        RenditionStatus::Error
    );
}
