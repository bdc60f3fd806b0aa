//! Types for the job module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::layout::JobLayout;
use crate::ladder::Ladder;

/// Lifecycle state of a job. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Pending, JobState::Failed)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
        )
    }
}

/// One transcode request for a single source file.
#[derive(Debug, Clone)]
pub struct Job {
    /// Job id, the source filename.
    pub id: String,
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub ladder: Ladder,
}

impl Job {
    pub fn new(layout: &JobLayout, ladder: Ladder) -> Self {
        Self {
            id: layout.filename.clone(),
            source_path: layout.source_path.clone(),
            output_dir: layout.output_dir.clone(),
            ladder,
        }
    }
}

/// What the runner knows about a job, past or present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub state: JobState,
    pub total_renditions: usize,
    /// Renditions currently listed in the master manifest.
    pub renditions_published: usize,
    /// Height of the rendition being encoded, while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_height: Option<u32>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    pub fn new(id: impl Into<String>, total_renditions: usize) -> Self {
        Self {
            id: id.into(),
            state: JobState::Pending,
            total_renditions,
            renditions_published: 0,
            current_height: None,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }
}
