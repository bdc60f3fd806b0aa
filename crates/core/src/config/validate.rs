use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one upload extension is allowed
/// - CPU share is a percentage in 1..=100
/// - Segment duration is positive
/// - The ladder is non-empty and strictly ascending
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.storage.allowed_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.allowed_extensions cannot be empty".to_string(),
        ));
    }

    if !(1..=100).contains(&config.encoder.cpu_share_percent) {
        return Err(ConfigError::ValidationError(format!(
            "encoder.cpu_share_percent must be between 1 and 100, got {}",
            config.encoder.cpu_share_percent
        )));
    }

    if config.encoder.segment_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.segment_duration_secs cannot be 0".to_string(),
        ));
    }

    config
        .ladder
        .to_ladder()
        .map_err(|e| ConfigError::ValidationError(format!("ladder: {}", e)))?;

    Ok(())
}
