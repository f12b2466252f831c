//! Error types for settings loading and validation.

use thiserror::Error;

/// Errors that can occur while loading, saving or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error while reading or writing a settings file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The settings are structurally valid but semantically wrong.
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
