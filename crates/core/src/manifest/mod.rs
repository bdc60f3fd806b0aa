//! HLS master manifest.
//!
//! The master manifest lists one variant per completed rendition, in ladder
//! order. It is regenerated from scratch after every rendition completes and
//! swapped into place with a rename, so readers see either the previous or the
//! next full manifest.

mod error;
mod publisher;
mod types;

pub use error::ManifestError;
pub use publisher::{read_master, ManifestPublisher, MASTER_MANIFEST_NAME};
pub use types::{MasterManifest, VariantEntry};
