//! Status query service.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::JobStatusView;
use crate::job::{JobLayout, JobRunner};
use crate::manifest::read_master;
use crate::progress::ProgressStore;

/// Answers `status(filename)` for uploaded videos.
#[derive(Clone)]
pub struct StatusService {
    upload_dir: PathBuf,
    total_resolutions: usize,
    progress: Arc<ProgressStore>,
    runner: Option<JobRunner>,
}

impl StatusService {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        total_resolutions: usize,
        progress: Arc<ProgressStore>,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            total_resolutions,
            progress,
            runner: None,
        }
    }

    /// Builds a service sharing the runner's progress store and job records.
    pub fn for_runner(
        upload_dir: impl Into<PathBuf>,
        total_resolutions: usize,
        runner: JobRunner,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            total_resolutions,
            progress: Arc::clone(runner.progress()),
            runner: Some(runner),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Reports where the job for `filename` stands.
    ///
    /// Never fails: unreadable manifests are reported as an `Error` view.
    pub async fn status(&self, filename: &str) -> JobStatusView {
        let layout = match JobLayout::new(&self.upload_dir, filename) {
            Ok(layout) => layout,
            Err(e) => {
                debug!(filename, error = %e, "Status requested for invalid filename");
                return JobStatusView::NotFound;
            }
        };

        let job_state = match &self.runner {
            Some(runner) => runner.job(filename).await.map(|record| record.state),
            None => None,
        };

        let manifest = read_master(&layout.master_path).await;
        let ffmpeg_progress = self.progress.snapshot(filename).await;
        let renditions_completed = self.progress.completed_count(filename).await;

        match manifest {
            Ok(None) => {
                if !path_exists(&layout.source_path).await {
                    return JobStatusView::NotFound;
                }
                JobStatusView::Pending {
                    resolutions_available: 0,
                    total_resolutions: self.total_resolutions,
                    renditions_completed,
                    ffmpeg_progress,
                    job_state,
                }
            }
            Ok(Some(manifest)) => {
                let resolutions_available = manifest.len();
                if resolutions_available >= self.total_resolutions {
                    JobStatusView::Completed {
                        resolutions_available,
                        total_resolutions: self.total_resolutions,
                        renditions_completed,
                        hls_master: layout.hls_master,
                        ffmpeg_progress,
                        job_state,
                    }
                } else {
                    JobStatusView::Processing {
                        resolutions_available,
                        total_resolutions: self.total_resolutions,
                        renditions_completed,
                        hls_master: layout.hls_master,
                        ffmpeg_progress,
                        job_state,
                    }
                }
            }
            Err(e) => {
                warn!(filename, error = %e, "Failed to read master manifest");
                JobStatusView::Error {
                    error: e.to_string(),
                    ffmpeg_progress,
                    job_state,
                }
            }
        }
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
