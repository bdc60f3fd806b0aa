//! Job runner implementation.

use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

use super::machine::{JobMachine, TransitionError};
use super::types::{Job, JobRecord, JobState};
use crate::encoder::{EncodeRequest, EncoderError, RenditionEncoder};
use crate::manifest::{ManifestError, ManifestPublisher};
use crate::metrics::{
    JOBS_ACTIVE, JOBS_FINISHED, JOBS_STARTED, RENDITIONS_ENCODED, RENDITION_DURATION,
};
use crate::progress::ProgressStore;

/// Error type for job submission.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// A job with this id is pending or running.
    #[error("Job already active: {0}")]
    AlreadyActive(String),

    /// Another active job writes to the same output directory, e.g.
    /// `clip.mp4` and `clip.mov` both publish into `hls_clip`.
    #[error("Output directory {output_dir:?} is in use by job {active}")]
    OutputInUse { output_dir: PathBuf, active: String },
}

/// Why a job ended in `Failed`.
#[derive(Debug, thiserror::Error)]
pub enum JobFailure {
    /// A rendition encode failed.
    #[error("Rendition {height}p failed: {source}")]
    Encode {
        height: u32,
        #[source]
        source: EncoderError,
    },

    /// The master manifest could not be written.
    #[error("Manifest publish failed: {0}")]
    ManifestWrite(#[from] ManifestError),

    /// The output directory could not be prepared.
    #[error("Failed to prepare output directory: {0}")]
    Setup(#[from] std::io::Error),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The job task panicked.
    #[error("Job task aborted: {0}")]
    Aborted(String),
}

/// Handle to a started job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: String,
    state_rx: watch::Receiver<JobState>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> JobState {
        *self.state_rx.borrow()
    }

    /// Waits until the job reaches a terminal state.
    pub async fn wait(mut self) -> JobState {
        let reached = match self.state_rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => Some(*state),
            Err(_) => None,
        };
        reached.unwrap_or_else(|| *self.state_rx.borrow())
    }
}

#[derive(Debug)]
struct RegistryEntry {
    record: JobRecord,
    output_dir: PathBuf,
    /// Registration generation, so a stale reservation never evicts a newer one.
    token: u64,
}

/// Known jobs keyed by id.
#[derive(Debug, Default)]
struct JobRegistry {
    jobs: RwLock<HashMap<String, RegistryEntry>>,
    next_token: AtomicU64,
}

impl JobRegistry {
    /// Inserts a fresh `Pending` record unless the id, or the output
    /// directory it writes to, belongs to an active job.
    async fn register(&self, job: &Job) -> Result<u64, JobError> {
        let mut jobs = self.jobs.write().await;
        for (id, entry) in jobs.iter() {
            if entry.record.state.is_terminal() {
                continue;
            }
            if *id == job.id {
                return Err(JobError::AlreadyActive(job.id.clone()));
            }
            if entry.output_dir == job.output_dir {
                return Err(JobError::OutputInUse {
                    output_dir: job.output_dir.clone(),
                    active: id.clone(),
                });
            }
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        jobs.insert(
            job.id.clone(),
            RegistryEntry {
                record: JobRecord::new(&job.id, job.ladder.len()),
                output_dir: job.output_dir.clone(),
                token,
            },
        );
        Ok(token)
    }

    /// Drops a reservation that never started.
    fn release(entries: &mut HashMap<String, RegistryEntry>, id: &str, token: u64) {
        let unstarted = entries
            .get(id)
            .is_some_and(|e| e.token == token && e.record.state == JobState::Pending);
        if unstarted {
            entries.remove(id);
        }
    }

    async fn get(&self, id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(id).map(|e| e.record.clone())
    }

    async fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self
            .jobs
            .read()
            .await
            .values()
            .map(|e| e.record.clone())
            .collect();
        records.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        records
    }

    async fn update<F>(&self, id: &str, f: F)
    where
        F: FnOnce(&mut JobRecord),
    {
        if let Some(entry) = self.jobs.write().await.get_mut(id) {
            f(&mut entry.record);
        }
    }

    /// Moves a job to `next` if that is a forward transition.
    async fn transition(&self, id: &str, next: JobState, error: Option<String>) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(record) = jobs.get_mut(id).map(|e| &mut e.record) else {
            return false;
        };
        if !record.state.can_transition_to(next) {
            return false;
        }
        record.state = next;
        if next.is_terminal() {
            record.finished_at = Some(Utc::now());
            record.current_height = None;
            record.error = error;
        }
        true
    }
}

/// Releases a registered id when its reservation is dropped unstarted.
struct ReservationGuard {
    registry: Arc<JobRegistry>,
    id: String,
    token: u64,
    armed: bool,
}

impl Drop for ReservationGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut jobs) = self.registry.jobs.try_write() {
            JobRegistry::release(&mut jobs, &self.id, self.token);
            return;
        }
        // Lock is busy; finish the release on the runtime
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let registry = Arc::clone(&self.registry);
            let id = std::mem::take(&mut self.id);
            let token = self.token;
            handle.spawn(async move {
                let mut jobs = registry.jobs.write().await;
                JobRegistry::release(&mut jobs, &id, token);
            });
        }
    }
}

/// A job registered under its id but not yet running.
///
/// Holding a reservation keeps other submissions for the same id or output
/// directory out, so the caller can prepare the source file safely. Dropping
/// it without calling [`JobReservation::start`] frees the id again.
pub struct JobReservation {
    runner: JobRunner,
    job: Job,
    guard: ReservationGuard,
}

impl JobReservation {
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Spawns the reserved job.
    pub fn start(self) -> JobHandle {
        let JobReservation {
            runner,
            job,
            mut guard,
        } = self;
        guard.armed = false;
        runner.spawn(job)
    }
}

/// Runs jobs in the background, one supervised task per job.
#[derive(Clone)]
pub struct JobRunner {
    encoder: Arc<dyn RenditionEncoder>,
    progress: Arc<ProgressStore>,
    publisher: ManifestPublisher,
    registry: Arc<JobRegistry>,
}

impl JobRunner {
    pub fn new(encoder: Arc<dyn RenditionEncoder>, progress: Arc<ProgressStore>) -> Self {
        Self {
            encoder,
            progress,
            publisher: ManifestPublisher::new(),
            registry: Arc::new(JobRegistry::default()),
        }
    }

    pub fn progress(&self) -> &Arc<ProgressStore> {
        &self.progress
    }

    pub fn encoder_name(&self) -> &str {
        self.encoder.name()
    }

    pub async fn job(&self, id: &str) -> Option<JobRecord> {
        self.registry.get(id).await
    }

    pub async fn jobs(&self) -> Vec<JobRecord> {
        self.registry.list().await
    }

    /// Registers a job without starting it.
    pub async fn reserve(&self, job: Job) -> Result<JobReservation, JobError> {
        let token = self.registry.register(&job).await?;
        let guard = ReservationGuard {
            registry: Arc::clone(&self.registry),
            id: job.id.clone(),
            token,
            armed: true,
        };
        Ok(JobReservation {
            runner: self.clone(),
            job,
            guard,
        })
    }

    /// Starts a job in the background and returns without waiting for any
    /// rendition.
    pub async fn start(&self, job: Job) -> Result<JobHandle, JobError> {
        Ok(self.reserve(job).await?.start())
    }

    fn spawn(&self, job: Job) -> JobHandle {
        let job_id = job.id.clone();
        let (state_tx, state_rx) = watch::channel(JobState::Pending);

        JOBS_STARTED.inc();
        JOBS_ACTIVE.inc();
        info!(job_id = %job_id, renditions = job.ladder.len(), "Job started");

        let runner = self.clone();
        let worker_tx = state_tx.clone();
        let worker = tokio::spawn(async move { runner.run_job(job, worker_tx).await });

        // Supervisor: a panicking worker still ends as Failed
        let registry = Arc::clone(&self.registry);
        let progress = Arc::clone(&self.progress);
        let supervised_id = job_id.clone();
        tokio::spawn(async move {
            if let Err(join_error) = worker.await {
                let failure = JobFailure::Aborted(join_error.to_string());
                error!(job_id = %supervised_id, error = %failure, "Job task crashed");
                let in_flight = registry
                    .get(&supervised_id)
                    .await
                    .and_then(|r| r.current_height);
                if let Some(height) = in_flight {
                    progress
                        .mark_failed(&supervised_id, height, failure.to_string())
                        .await;
                }
                if registry
                    .transition(&supervised_id, JobState::Failed, Some(failure.to_string()))
                    .await
                {
                    JOBS_FINISHED.with_label_values(&["failed"]).inc();
                    JOBS_ACTIVE.dec();
                }
                state_tx.send_replace(JobState::Failed);
            }
        });

        JobHandle { job_id, state_rx }
    }

    async fn run_job(&self, job: Job, state_tx: watch::Sender<JobState>) -> JobState {
        let job_id = job.id.clone();

        let (state, error) = match self.walk_ladder(&job, &state_tx).await {
            Ok(()) => {
                info!(job_id = %job_id, "Job completed");
                (JobState::Completed, None)
            }
            Err(failure) => {
                error!(job_id = %job_id, error = %failure, "Job failed");
                (JobState::Failed, Some(failure.to_string()))
            }
        };

        if self.registry.transition(&job_id, state, error).await {
            let result = if state == JobState::Completed {
                "completed"
            } else {
                "failed"
            };
            JOBS_FINISHED.with_label_values(&[result]).inc();
            JOBS_ACTIVE.dec();
        }
        state_tx.send_replace(state);
        state
    }

    async fn walk_ladder(
        &self,
        job: &Job,
        state_tx: &watch::Sender<JobState>,
    ) -> Result<(), JobFailure> {
        // A restarted id begins from a clean slate
        self.progress.reset_job(&job.id).await;
        tokio::fs::create_dir_all(&job.output_dir).await?;
        if let Err(e) = self.publisher.clear(&job.output_dir).await {
            warn!(job_id = %job.id, error = %e, "Failed to remove stale manifest");
        }

        let mut machine = JobMachine::new(job.ladder.clone());
        let mut next = Some(machine.start()?.clone());

        self.registry
            .transition(&job.id, JobState::Running, None)
            .await;
        state_tx.send_replace(JobState::Running);

        while let Some(rendition) = next {
            let height = rendition.height;
            self.registry
                .update(&job.id, |r| r.current_height = Some(height))
                .await;

            let request = EncodeRequest {
                job_id: job.id.clone(),
                source_path: job.source_path.clone(),
                output_dir: job.output_dir.clone(),
                rendition,
            };
            let tracker = self.progress.tracker(&job.id, height);
            let height_label = height.to_string();
            let started = Instant::now();

            if let Err(source) = self.encoder.encode(request, tracker).await {
                RENDITIONS_ENCODED
                    .with_label_values(&[&height_label, "failed"])
                    .inc();
                machine.fail();
                return Err(JobFailure::Encode { height, source });
            }

            RENDITIONS_ENCODED
                .with_label_values(&[&height_label, "success"])
                .inc();
            RENDITION_DURATION
                .with_label_values(&[&height_label])
                .observe(started.elapsed().as_secs_f64());

            let prefix = machine.encoded()?;
            if let Err(e) = self.publisher.publish(&job.output_dir, &prefix).await {
                machine.fail();
                return Err(e.into());
            }

            let published = prefix.len();
            self.registry
                .update(&job.id, |r| r.renditions_published = published)
                .await;
            info!(
                job_id = %job.id,
                height,
                published,
                total = job.ladder.len(),
                "Rendition published"
            );

            next = machine.published()?.cloned();
        }

        Ok(())
    }
}
