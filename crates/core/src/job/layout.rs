//! On-disk layout of a job.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::manifest::MASTER_MANIFEST_NAME;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("filename is empty")]
    Empty,

    #[error("filename must not contain path components: {0}")]
    PathComponent(String),
}

/// Paths of one job, derived from the upload directory and source filename.
///
/// ```text
/// <upload_dir>/<filename>                  source
/// <upload_dir>/hls_<stem>/master.m3u8      master manifest
/// <upload_dir>/hls_<stem>/v<i>/...         variant playlists and segments
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLayout {
    pub filename: String,
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub master_path: PathBuf,
    /// Master manifest path relative to the upload directory.
    pub hls_master: String,
}

impl JobLayout {
    pub fn new(upload_dir: &Path, filename: &str) -> Result<Self, LayoutError> {
        validate_filename(filename)?;

        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());
        let output_name = format!("hls_{}", stem);
        let output_dir = upload_dir.join(&output_name);

        Ok(Self {
            filename: filename.to_string(),
            source_path: upload_dir.join(filename),
            master_path: output_dir.join(MASTER_MANIFEST_NAME),
            output_dir,
            hls_master: format!("{}/{}", output_name, MASTER_MANIFEST_NAME),
        })
    }

    /// Lower-cased extension of the source filename.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Whether the source extension is one of `allowed` (case-insensitive).
    pub fn has_allowed_extension(&self, allowed: &[String]) -> bool {
        match self.extension() {
            Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
            None => false,
        }
    }
}

fn validate_filename(filename: &str) -> Result<(), LayoutError> {
    if filename.trim().is_empty() {
        return Err(LayoutError::Empty);
    }
    if filename == "." || filename == ".." || filename.contains(['/', '\\', '\0']) {
        return Err(LayoutError::PathComponent(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = JobLayout::new(Path::new("/srv/uploads"), "holiday.mp4").unwrap();
        assert_eq!(layout.source_path, PathBuf::from("/srv/uploads/holiday.mp4"));
        assert_eq!(layout.output_dir, PathBuf::from("/srv/uploads/hls_holiday"));
        assert_eq!(
            layout.master_path,
            PathBuf::from("/srv/uploads/hls_holiday/master.m3u8")
        );
        assert_eq!(layout.hls_master, "hls_holiday/master.m3u8");
    }

    #[test]
    fn test_layout_keeps_inner_dots() {
        let layout = JobLayout::new(Path::new("up"), "my.trip.2024.MOV").unwrap();
        assert_eq!(layout.hls_master, "hls_my.trip.2024/master.m3u8");
        assert_eq!(layout.extension().as_deref(), Some("mov"));
    }

    #[test]
    fn test_rejects_traversal() {
        assert_eq!(
            JobLayout::new(Path::new("up"), "../etc/passwd"),
            Err(LayoutError::PathComponent("../etc/passwd".to_string()))
        );
        assert!(JobLayout::new(Path::new("up"), "..").is_err());
        assert!(JobLayout::new(Path::new("up"), "a\\b.mp4").is_err());
        assert_eq!(JobLayout::new(Path::new("up"), "  "), Err(LayoutError::Empty));
    }

    #[test]
    fn test_allowed_extension() {
        let allowed = vec!["mp4".to_string(), "mkv".to_string()];
        let ok = JobLayout::new(Path::new("up"), "clip.MKV").unwrap();
        let bad = JobLayout::new(Path::new("up"), "clip.gif").unwrap();
        let none = JobLayout::new(Path::new("up"), "clip").unwrap();

        assert!(ok.has_allowed_extension(&allowed));
        assert!(!bad.has_allowed_extension(&allowed));
        assert!(!none.has_allowed_extension(&allowed));
    }
}
