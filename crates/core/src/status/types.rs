//! Types for the status module.

use serde::{Deserialize, Serialize};

use crate::job::JobState;
use crate::progress::ProgressSnapshot;

/// Externally visible state of a job, tagged on `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatusView {
    /// No upload with this filename exists.
    NotFound,

    /// Source uploaded, no manifest published yet.
    Pending {
        resolutions_available: usize,
        total_resolutions: usize,
        renditions_completed: usize,
        ffmpeg_progress: ProgressSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_state: Option<JobState>,
    },

    /// Some renditions are published.
    Processing {
        resolutions_available: usize,
        total_resolutions: usize,
        renditions_completed: usize,
        hls_master: String,
        ffmpeg_progress: ProgressSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_state: Option<JobState>,
    },

    /// Every rendition of the ladder is published.
    Completed {
        resolutions_available: usize,
        total_resolutions: usize,
        renditions_completed: usize,
        hls_master: String,
        ffmpeg_progress: ProgressSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_state: Option<JobState>,
    },

    /// The manifest exists but could not be read.
    Error {
        error: String,
        ffmpeg_progress: ProgressSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_state: Option<JobState>,
    },
}

impl JobStatusView {
    /// Value of the `status` tag.
    pub fn label(&self) -> &'static str {
        match self {
            JobStatusView::NotFound => "not_found",
            JobStatusView::Pending { .. } => "pending",
            JobStatusView::Processing { .. } => "processing",
            JobStatusView::Completed { .. } => "completed",
            JobStatusView::Error { .. } => "error",
        }
    }

    /// HTTP status code the view is served with.
    pub fn http_status(&self) -> u16 {
        match self {
            JobStatusView::NotFound => 404,
            JobStatusView::Error { .. } => 500,
            _ => 200,
        }
    }

    /// Published variant count, when known.
    pub fn resolutions_available(&self) -> Option<usize> {
        match self {
            JobStatusView::Pending {
                resolutions_available,
                ..
            }
            | JobStatusView::Processing {
                resolutions_available,
                ..
            }
            | JobStatusView::Completed {
                resolutions_available,
                ..
            } => Some(*resolutions_available),
            _ => None,
        }
    }

    pub fn ffmpeg_progress(&self) -> Option<&ProgressSnapshot> {
        match self {
            JobStatusView::NotFound => None,
            JobStatusView::Pending {
                ffmpeg_progress, ..
            }
            | JobStatusView::Processing {
                ffmpeg_progress, ..
            }
            | JobStatusView::Completed {
                ffmpeg_progress, ..
            }
            | JobStatusView::Error {
                ffmpeg_progress, ..
            } => Some(ffmpeg_progress),
        }
    }
}
