//! Rendition ladder.
//!
//! The ladder is the static, ordered list of renditions every job walks from
//! lowest to highest quality. A rendition's `index` equals its position in the
//! ladder, which keeps variant directory names (`v0`, `v1`, ...) stable.
//!
//! The ladder is never derived from the source video: a 480p upload still
//! gets a 1440p rendition attempted.

mod types;

pub use types::{Ladder, LadderError, RenditionSpec};
