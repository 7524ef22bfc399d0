//! Roulette configuration.
//!
//! TOML-based configuration for the matching service, signaling relay,
//! media capture, and peer connection. Every section uses serde defaults
//! so an empty file is a working config pointed at local services.
//!
//! ```rust,no_run
//! use roulette_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config.matching.http_url);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    LogLevel, LoggingConfig, MatchingServiceConfig, MediaConfig, PeerConnectionConfig,
    RouletteConfig, SignalingServiceConfig,
};

use roulette_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path, creating it if missing,
/// and validate the result.
pub fn load_config() -> Result<RouletteConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load and validate config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<RouletteConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &RouletteConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&RouletteConfig::default());
        assert!(json.contains("\"matching\""));
        assert!(json.contains("\"signaling\""));
        assert!(json.contains("\"media\""));
        assert!(json.contains("\"peer\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn load_config_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[signaling]\nws_url = \"http://relay\"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("signaling.ws_url"));
    }

    #[test]
    fn load_config_from_accepts_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[matching]\nhttp_url = \"https://match.example.com\"\nws_url = \"wss://match.example.com\"\n",
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.matching.http_url, "https://match.example.com");
        assert_eq!(config.signaling.ws_url, "ws://localhost:4000");
    }
}
