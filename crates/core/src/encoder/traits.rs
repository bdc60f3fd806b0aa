//! Trait definitions for the encoder module.

use async_trait::async_trait;

use super::error::EncoderError;
use super::types::{EncodeOutput, EncodeRequest};
use crate::progress::RenditionTracker;

/// Produces one HLS variant per call.
///
/// Implementations report through the tracker: progress events while running,
/// then exactly one of `complete()` or `fail()` once the work has finished.
/// `complete()` must not be called before the underlying work has exited
/// successfully.
#[async_trait]
pub trait RenditionEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Encodes a single rendition.
    async fn encode(
        &self,
        request: EncodeRequest,
        tracker: RenditionTracker,
    ) -> Result<EncodeOutput, EncoderError>;

    /// Validates that the encoder is properly configured and ready.
    async fn validate(&self) -> Result<(), EncoderError>;
}
