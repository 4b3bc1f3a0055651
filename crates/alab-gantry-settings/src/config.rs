//! Gantry configuration files
//!
//! A [`GantryConfig`] bundles everything needed to open a session: the
//! serial connection settings, the machine profile and an optional path to
//! a waypoint table. Files are JSON or TOML, chosen by extension, and are
//! validated both on load and on save.

use crate::error::{SettingsError, SettingsResult};
use crate::waypoints::WaypointTable;
use alab_gantry_communication::{
    communication::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS},
    ConnectionParams,
};
use alab_gantry_core::MachineProfile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "alab-gantry";
const CONFIG_FILE: &str = "config.toml";

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Port to open; prompt interactively when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Baud rate for the serial link
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Read timeout for a single line in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl ConnectionSettings {
    /// Connection parameters for `port`, using these settings
    pub fn params_for(&self, port: impl Into<String>) -> ConnectionParams {
        ConnectionParams::new(port)
            .with_baud_rate(self.baud_rate)
            .with_read_timeout_ms(self.read_timeout_ms)
    }
}

/// Complete gantry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GantryConfig {
    /// Waypoint table to load alongside the profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<PathBuf>,
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionSettings,
    /// Machine profile
    #[serde(default)]
    pub machine: MachineProfile,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat {
            extension: other.unwrap_or_default().to_string(),
            expected: ".json, .toml".to_string(),
        }),
    }
}

impl GantryConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the user's config file
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("No configuration directory on this platform".into())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.connection.baud_rate == 0 {
            return Err(SettingsError::InvalidSetting {
                key: "connection.baud_rate".to_string(),
                reason: "must be > 0".to_string(),
            });
        }

        if self.connection.read_timeout_ms == 0 {
            return Err(SettingsError::InvalidSetting {
                key: "connection.read_timeout_ms".to_string(),
                reason: "must be > 0".to_string(),
            });
        }

        if matches!(self.connection.port.as_deref(), Some(port) if port.trim().is_empty()) {
            return Err(SettingsError::InvalidSetting {
                key: "connection.port".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        self.machine.validate()?;
        Ok(())
    }

    /// The configured waypoint table, or an empty one
    pub fn load_waypoints(&self) -> SettingsResult<WaypointTable> {
        match &self.waypoints {
            Some(path) => WaypointTable::load(path),
            None => Ok(WaypointTable::new()),
        }
    }
}
