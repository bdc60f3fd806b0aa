//! Progress store for in-flight jobs.
//!
//! The store maps job id → rendition height → [`RenditionProgress`]. Each
//! job's renditions are written by exactly one encoder at a time (the ladder
//! is sequential), while any number of status queries read snapshots
//! concurrently.
//!
//! Encoders never touch the store directly; they receive a
//! [`RenditionTracker`] bound to their job and rendition.

mod store;
mod types;

pub use store::{ProgressSnapshot, ProgressStore, RenditionTracker};
pub use types::{ProgressEvent, ProgressField, RenditionProgress, RenditionStatus};
