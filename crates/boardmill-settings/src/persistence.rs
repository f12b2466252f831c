//! Settings persistence.
//!
//! Settings live in a TOML file under the platform configuration directory.
//! A missing file yields defaults which are written back, so the operator
//! always has a file to edit.

use crate::config::Settings;
use crate::error::{SettingsError, SettingsResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Default settings file location under the user configuration directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("boardmill")
        .join("settings.toml")
}

impl Settings {
    /// Load settings from the default location.
    ///
    /// A missing file is not an error: defaults are returned and written
    /// back so the operator has something to edit. A file that exists but
    /// fails to parse or validate is an error; silently machining with
    /// defaults the operator did not ask for would be worse.
    pub fn load() -> SettingsResult<Self> {
        Self::load_or_init(&default_config_path())
    }

    /// Load from `path`, creating it with defaults when missing.
    pub fn load_or_init(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            return Self::load_from_file(path);
        }

        tracing::info!(path = %path.display(), "Settings file missing, creating defaults");
        let settings = Settings::default();
        if let Err(err) = settings.save_to_file(path) {
            tracing::warn!(path = %path.display(), %err, "Could not write default settings");
        }
        Ok(settings)
    }

    /// Load and validate settings from a TOML file.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl SettingsError {
    /// True when the error indicates an unreadable or corrupt file rather
    /// than a semantic problem.
    pub fn is_file_error(&self) -> bool {
        matches!(self, SettingsError::Io(_) | SettingsError::Parse(_))
    }
}
