use super::{default_global_config_path, ConfigError, Settings};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads the global settings file, falling back to defaults when it does
/// not exist yet.
pub fn load_global_settings() -> Result<Settings, ConfigError> {
    let path = default_global_config_path()?;
    load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let settings = Settings::from_path(path)?;
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<PathBuf, ConfigError> {
    settings.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let body = serde_yaml::to_string(settings).map_err(|source| ConfigError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, body).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path.to_path_buf())
}
