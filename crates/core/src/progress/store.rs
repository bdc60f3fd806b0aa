//! Shared progress store implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::{ProgressEvent, RenditionProgress, RenditionStatus};

/// Progress of every rendition of one job, keyed by rendition height.
pub type ProgressSnapshot = BTreeMap<u32, RenditionProgress>;

/// Process-wide progress state, keyed by job id and rendition height.
#[derive(Debug, Default)]
pub struct ProgressStore {
    jobs: RwLock<HashMap<String, ProgressSnapshot>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one progress event, overwriting the previous value for its
    /// field. The first write flips the rendition to `Processing`.
    pub async fn record(&self, job_id: &str, height: u32, event: &ProgressEvent) {
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .entry(job_id.to_string())
            .or_default()
            .entry(height)
            .or_default();

        if entry.status == RenditionStatus::Pending {
            entry.status = RenditionStatus::Processing;
        }
        entry
            .metrics
            .insert(event.field.as_str().to_string(), event.value.clone());
    }

    pub async fn mark_processing(&self, job_id: &str, height: u32) {
        self.set_status(job_id, height, RenditionStatus::Processing, None)
            .await;
    }

    /// Marks a rendition completed. Metrics keep their last observed values.
    pub async fn mark_completed(&self, job_id: &str, height: u32) {
        self.set_status(job_id, height, RenditionStatus::Completed, None)
            .await;
    }

    pub async fn mark_failed(&self, job_id: &str, height: u32, diagnostic: impl Into<String>) {
        self.set_status(
            job_id,
            height,
            RenditionStatus::Error,
            Some(diagnostic.into()),
        )
        .await;
    }

    async fn set_status(
        &self,
        job_id: &str,
        height: u32,
        status: RenditionStatus,
        error: Option<String>,
    ) {
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .entry(job_id.to_string())
            .or_default()
            .entry(height)
            .or_default();
        entry.status = status;
        entry.error = error;
    }

    /// Returns a copy of everything recorded for a job (empty if unknown).
    pub async fn snapshot(&self, job_id: &str) -> ProgressSnapshot {
        self.jobs
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of renditions of a job whose status is `Completed`.
    pub async fn completed_count(&self, job_id: &str) -> usize {
        self.jobs
            .read()
            .await
            .get(job_id)
            .map(|renditions| {
                renditions
                    .values()
                    .filter(|p| p.status == RenditionStatus::Completed)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Drops all entries of a job so a restarted job begins clean.
    pub async fn reset_job(&self, job_id: &str) {
        self.jobs.write().await.remove(job_id);
    }

    /// Returns a tracker bound to one job rendition.
    pub fn tracker(self: &Arc<Self>, job_id: impl Into<String>, height: u32) -> RenditionTracker {
        RenditionTracker {
            store: Arc::clone(self),
            job_id: job_id.into(),
            height,
        }
    }
}

/// Write handle for a single job rendition.
///
/// An encoder holds exactly one tracker for the rendition it is producing,
/// which keeps the store single-writer per key.
#[derive(Debug, Clone)]
pub struct RenditionTracker {
    store: Arc<ProgressStore>,
    job_id: String,
    height: u32,
}

impl RenditionTracker {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub async fn start(&self) {
        self.store.mark_processing(&self.job_id, self.height).await;
    }

    pub async fn record(&self, event: &ProgressEvent) {
        self.store.record(&self.job_id, self.height, event).await;
    }

    pub async fn complete(&self) {
        self.store.mark_completed(&self.job_id, self.height).await;
    }

    pub async fn fail(&self, diagnostic: impl Into<String>) {
        self.store
            .mark_failed(&self.job_id, self.height, diagnostic)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressField;

    #[tokio::test]
    async fn test_record_overwrites_latest_value() {
        let store = ProgressStore::new();
        store
            .record("movie.mp4", 144, &ProgressEvent::new(ProgressField::Frame, "10"))
            .await;
        store
            .record("movie.mp4", 144, &ProgressEvent::new(ProgressField::Frame, "20"))
            .await;
        store
            .record("movie.mp4", 144, &ProgressEvent::new(ProgressField::Speed, "2x"))
            .await;

        let snapshot = store.snapshot("movie.mp4").await;
        let progress = &snapshot[&144];
        assert_eq!(progress.status, RenditionStatus::Processing);
        assert_eq!(progress.metrics.len(), 2);
        assert_eq!(progress.metrics["frame"], "20");
        assert_eq!(progress.metrics["speed"], "2x");
    }

    #[tokio::test]
    async fn test_completed_keeps_last_metrics() {
        let store = Arc::new(ProgressStore::new());
        let tracker = store.tracker("movie.mp4", 240);
        tracker
            .record(&ProgressEvent::new(ProgressField::Time, "00:00:09.98"))
            .await;
        tracker.complete().await;

        let snapshot = store.snapshot("movie.mp4").await;
        assert_eq!(snapshot[&240].status, RenditionStatus::Completed);
        assert_eq!(snapshot[&240].metrics["time"], "00:00:09.98");
        assert_eq!(store.completed_count("movie.mp4").await, 1);
    }

    #[tokio::test]
    async fn test_failed_carries_diagnostic() {
        let store = Arc::new(ProgressStore::new());
        let tracker = store.tracker("movie.mp4", 360);
        tracker.start().await;
        tracker.fail("Invalid data found when processing input").await;

        let snapshot = store.snapshot("movie.mp4").await;
        assert_eq!(snapshot[&360].status, RenditionStatus::Error);
        assert_eq!(
            snapshot[&360].error.as_deref(),
            Some("Invalid data found when processing input")
        );
        assert_eq!(store.completed_count("movie.mp4").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_job_snapshot_is_empty() {
        let store = ProgressStore::new();
        assert!(store.snapshot("missing.mp4").await.is_empty());
        assert_eq!(store.completed_count("missing.mp4").await, 0);
    }

    #[tokio::test]
    async fn test_reset_job_only_touches_that_job() {
        let store = Arc::new(ProgressStore::new());
        store.tracker("a.mp4", 144).complete().await;
        store.tracker("b.mp4", 144).complete().await;

        store.reset_job("a.mp4").await;

        assert!(store.snapshot("a.mp4").await.is_empty());
        assert_eq!(store.completed_count("b.mp4").await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writer() {
        let store = Arc::new(ProgressStore::new());
        let tracker = store.tracker("movie.mp4", 720);

        let writer = tokio::spawn(async move {
            for frame in 0..200 {
                tracker
                    .record(&ProgressEvent::new(ProgressField::Frame, frame.to_string()))
                    .await;
            }
            tracker.complete().await;
        });

        let mut readers = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let snapshot = store.snapshot("movie.mp4").await;
                    if let Some(progress) = snapshot.get(&720) {
                        assert!(progress.metrics.len() <= 1);
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }

        let snapshot = store.snapshot("movie.mp4").await;
        assert_eq!(snapshot[&720].metrics["frame"], "199");
        assert_eq!(snapshot[&720].status, RenditionStatus::Completed);
    }
}
