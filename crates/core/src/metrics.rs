//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (started, finished by result, active)
//! - Renditions (encodes by result, encode duration)
//! - Manifest publishing

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs started total.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("hlsladder_jobs_started_total", "Total transcode jobs started").unwrap()
});

/// Jobs finished total by result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hlsladder_jobs_finished_total", "Total transcode jobs finished"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Jobs currently running.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("hlsladder_jobs_active", "Number of transcode jobs currently running").unwrap()
});

// =============================================================================
// Renditions
// =============================================================================

/// Rendition encodes total by height and result.
pub static RENDITIONS_ENCODED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hlsladder_renditions_total", "Total rendition encodes"),
        &["height", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Rendition encode duration in seconds.
pub static RENDITION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hlsladder_rendition_duration_seconds",
            "Duration of a single rendition encode",
        )
        .buckets(vec![
            1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0,
        ]),
        &["height"],
    )
    .unwrap()
});

// =============================================================================
// Manifests
// =============================================================================

/// Master manifest publishes total.
pub static MANIFEST_PUBLISHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hlsladder_manifest_publishes_total",
        "Total master manifest rewrites",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_ACTIVE.clone()),
        // Renditions
        Box::new(RENDITIONS_ENCODED.clone()),
        Box::new(RENDITION_DURATION.clone()),
        // Manifests
        Box::new(MANIFEST_PUBLISHES.clone()),
    ]
}
