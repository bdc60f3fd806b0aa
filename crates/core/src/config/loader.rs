use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use super::{types::Config, ConfigError};

const ENV_PREFIX: &str = "HLSLADDER_";

/// Load configuration from file with environment variable overrides
///
/// Nested keys are separated by a double underscore, e.g.
/// `HLSLADDER_SERVER__PORT=8080` or `HLSLADDER_STORAGE__UPLOAD_DIR=/data`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Like [`load_config`], but a missing file means defaults plus environment.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    match load_config(path) {
        Err(ConfigError::FileNotFound(missing)) => {
            info!(path = %missing, "Config file not found, using defaults");
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Env::prefixed(ENV_PREFIX).split("__"))
                .extract()
                .map_err(|e| ConfigError::ParseError(e.to_string()))
        }
        other => other,
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
