//! Full configuration validation.
//!
//! Each section has its own validator; errors from all of them are
//! collected into a single `ConfigError`.

mod helpers;
mod media;
mod services;


use crate::schema::RouletteConfig;
use roulette_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RouletteConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    services::validate_matching(&mut errors, config);
    services::validate_signaling(&mut errors, config);
    media::validate_media(&mut errors, config);
    media::validate_peer(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
