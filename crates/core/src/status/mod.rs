//! Status queries for transcode jobs.
//!
//! A status is derived from what is on disk (the uploaded source and the
//! published master manifest) together with the live progress store, so it
//! stays meaningful for jobs started before the current runner knew them.

mod service;
mod types;

pub use service::StatusService;
pub use types::JobStatusView;
