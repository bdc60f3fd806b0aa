use std::path::Path;

use hlsladder_core::{
    Config, JobRunner, Ladder, SanitizedConfig, StatusService, StorageConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    ladder: Ladder,
    runner: JobRunner,
    status: StatusService,
}

impl AppState {
    /// `ladder` must be the validated form of `config.ladder`.
    pub fn new(config: Config, ladder: Ladder, runner: JobRunner) -> Self {
        let status =
            StatusService::for_runner(&config.storage.upload_dir, ladder.len(), runner.clone());
        Self {
            config,
            ladder,
            runner,
            status,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.config.storage
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.storage.upload_dir
    }

    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    pub fn status(&self) -> &StatusService {
        &self.status
    }
}
