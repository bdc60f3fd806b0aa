//! Testing utilities and mock implementations.
//!
//! The mock encoder lets the job runner, the status service and the HTTP
//! layer be exercised end to end without an FFmpeg binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use hlsladder_core::testing::{fixtures, MockEncoder};
//!
//! let encoder = Arc::new(MockEncoder::new());
//! encoder.fail_at(360, "Conversion failed!");
//!
//! let runner = JobRunner::new(encoder.clone(), Arc::new(ProgressStore::new()));
//! let handle = runner.start(fixtures::job(upload_dir, "clip.mp4", fixtures::short_ladder())).await?;
//! ```

mod mock_encoder;

pub use mock_encoder::{MockEncoder, MockGate};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::job::{Job, JobLayout};
    use crate::ladder::Ladder;

    /// A three-rung ladder, enough to observe partial progress.
    pub fn short_ladder() -> Ladder {
        Ladder::new([
            (144, 200, "256x144"),
            (240, 400, "426x240"),
            (360, 800, "640x360"),
        ])
        .expect("fixture ladder is valid")
    }

    /// Writes a placeholder source file and returns its job.
    pub fn job(upload_dir: &Path, filename: &str, ladder: Ladder) -> Job {
        let layout = JobLayout::new(upload_dir, filename).expect("fixture filename is valid");
        std::fs::create_dir_all(upload_dir).expect("create upload dir");
        std::fs::write(&layout.source_path, b"not really a video").expect("write source");
        Job::new(&layout, ladder)
    }
}
