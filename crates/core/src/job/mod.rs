//! Job runner for the background transcode pipeline.
//!
//! A job walks the rendition ladder strictly in order, one encode at a time.
//! After each successful rendition the master manifest is rewritten with the
//! completed prefix; the first failure ends the job and leaves what was
//! already published in place.
//!
//! # Example
//!
//! ```ignore
//! use hlsladder_core::{FfmpegEncoder, EncoderConfig, Job, JobLayout, JobRunner, Ladder, ProgressStore};
//!
//! let progress = Arc::new(ProgressStore::new());
//! let runner = JobRunner::new(Arc::new(FfmpegEncoder::new(EncoderConfig::default())), progress);
//!
//! let layout = JobLayout::new(Path::new("uploads"), "movie.mp4")?;
//! let handle = runner.start(Job::new(&layout, Ladder::standard())).await?;
//!
//! // start() returned before any rendition was encoded
//! let final_state = handle.wait().await;
//! ```

mod layout;
mod machine;
mod runner;
mod types;

pub use layout::{JobLayout, LayoutError};
pub use machine::{JobMachine, JobPhase, TransitionError};
pub use runner::{JobError, JobFailure, JobHandle, JobReservation, JobRunner};
pub use types::{Job, JobRecord, JobState};
