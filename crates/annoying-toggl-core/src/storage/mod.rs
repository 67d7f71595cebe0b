mod config;

pub use config::{ApiConfig, Config, CHECK_INTERVAL_OPTIONS, MUTE_DURATION_OPTIONS};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/annoying-toggl[-dev]/` based on ANNOYING_TOGGL_ENV.
///
/// Set ANNOYING_TOGGL_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .ok_or(ConfigError::NoDataDir)?
        .join(".config");

    let env = std::env::var("ANNOYING_TOGGL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("annoying-toggl-dev")
    } else {
        base_dir.join("annoying-toggl")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
