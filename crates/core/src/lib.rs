pub mod config;
pub mod encoder;
pub mod job;
pub mod ladder;
pub mod manifest;
pub mod metrics;
pub mod progress;
pub mod status;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LadderConfig, RenditionConfig, SanitizedConfig, ServerConfig, StorageConfig,
};
pub use encoder::{
    CpuBudget, EncodeOutput, EncodeRequest, EncoderConfig, EncoderError, FfmpegEncoder,
    RenditionEncoder,
};
pub use job::{
    Job, JobError, JobFailure, JobHandle, JobLayout, JobMachine, JobPhase, JobRecord,
    JobReservation, JobRunner, JobState, LayoutError, TransitionError,
};
pub use ladder::{Ladder, LadderError, RenditionSpec};
pub use manifest::{
    read_master, ManifestError, ManifestPublisher, MasterManifest, VariantEntry,
    MASTER_MANIFEST_NAME,
};
pub use progress::{
    ProgressEvent, ProgressField, ProgressSnapshot, ProgressStore, RenditionProgress,
    RenditionStatus, RenditionTracker,
};
pub use status::{JobStatusView, StatusService};
