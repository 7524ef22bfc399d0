//! Read config from a path or from the platform default location.

use crate::schema::RouletteConfig;
use roulette_common::ConfigError;
use std::path::Path;
use tracing::info;

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Missing fields fall back to serde defaults. Validation is left to the
/// caller so the parsed file can be inspected even when it is invalid.
pub fn load_from_path(path: &Path) -> Result<RouletteConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: RouletteConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the default path (see [`default_config_path`]).
///
/// On macOS: `~/Library/Application Support/roulette/config.toml`
/// On Linux: `~/.config/roulette/config.toml`
///
/// If the file does not exist, a commented default is written and defaults
/// are returned.
pub fn load_default() -> Result<RouletteConfig, ConfigError> {
    let path = default_config_path()?;

    if create_default_config(&path)? {
        info!("no config found at {}, using defaults", path.display());
        return Ok(RouletteConfig::default());
    }

    load_from_path(&path)
}
