//! Error types for the settings crate.

use std::io;
use thiserror::Error;

/// Errors that can occur while loading or saving settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file extension is not one of the supported formats.
    #[error("Unsupported file format '{extension}', expected one of: {expected}")]
    UnsupportedFormat { extension: String, expected: String },

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// A waypoint row could not be parsed.
    #[error("Invalid waypoint on line {line}: {reason}")]
    InvalidWaypoint { line: u64, reason: String },

    /// The configuration directory could not be resolved.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Validation failure reported by the core types.
    #[error(transparent)]
    Core(#[from] alab_gantry_core::Error),
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SettingsError::InvalidSetting {
            key: "connection.baud_rate".to_string(),
            reason: "must be > 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid setting 'connection.baud_rate': must be > 0"
        );

        let err = SettingsError::InvalidWaypoint {
            line: 3,
            reason: "expected 4 fields".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid waypoint on line 3: expected 4 fields");
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err: SettingsError = alab_gantry_core::Error::other("Axis limits must be > 0").into();
        assert_eq!(err.to_string(), "Axis limits must be > 0");
    }
}
