//! Atomic master manifest publishing.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ManifestError;
use super::types::MasterManifest;
use crate::ladder::RenditionSpec;
use crate::metrics::MANIFEST_PUBLISHES;

/// File name of the master manifest inside a job output directory.
pub const MASTER_MANIFEST_NAME: &str = "master.m3u8";

/// Writes master manifests for a job output directory.
#[derive(Debug, Clone, Default)]
pub struct ManifestPublisher;

impl ManifestPublisher {
    pub fn new() -> Self {
        Self
    }

    pub fn master_path(output_dir: &Path) -> PathBuf {
        output_dir.join(MASTER_MANIFEST_NAME)
    }

    /// Regenerates the master manifest for the given completed renditions.
    ///
    /// The content is written to a sibling temp file and renamed over the
    /// manifest, so a concurrent reader never sees a half-written file.
    pub async fn publish(
        &self,
        output_dir: &Path,
        completed: &[RenditionSpec],
    ) -> Result<MasterManifest, ManifestError> {
        let manifest = MasterManifest::from_renditions(completed);
        let master_path = Self::master_path(output_dir);
        let temp_path = output_dir.join(format!("{}.tmp", MASTER_MANIFEST_NAME));

        tokio::fs::write(&temp_path, manifest.render())
            .await
            .map_err(|source| ManifestError::Write {
                path: temp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&temp_path, &master_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(ManifestError::Write {
                path: master_path,
                source,
            });
        }

        MANIFEST_PUBLISHES.inc();
        debug!(
            path = %master_path.display(),
            variants = manifest.len(),
            "Published master manifest"
        );

        Ok(manifest)
    }

    /// Removes a manifest left over from an earlier run of the same job.
    pub async fn clear(&self, output_dir: &Path) -> Result<(), ManifestError> {
        let master_path = Self::master_path(output_dir);
        match tokio::fs::remove_file(&master_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ManifestError::Write {
                path: master_path,
                source,
            }),
        }
    }
}

/// Reads and parses a master manifest. `Ok(None)` when the file does not exist.
pub async fn read_master(path: &Path) -> Result<Option<MasterManifest>, ManifestError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ManifestError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let text = String::from_utf8(bytes)
        .map_err(|e| ManifestError::parse(format!("manifest is not UTF-8: {}", e)))?;

    MasterManifest::parse(&text).map(Some)
}
