//! Configuration for SolidKit
//!
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Logging (default filter when `RUST_LOG` is unset)
//! - Undo history depth
//! - Event bus capacity and history retention
//! - Gizmo interaction defaults
//! - Key bindings (key to command identifier)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Modes a gizmo execution can run in.
pub const INTERACTION_MODES: &[&str] = &["persistent", "transitory"];

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Oldest entries are dropped beyond this many
    pub max_depth: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// Event bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusSettings {
    pub channel_capacity: usize,
    /// Keep recent events for inspection
    pub enable_history: bool,
    pub max_history_size: usize,
}

impl Default for EventBusSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            enable_history: false,
            max_history_size: 1000,
        }
    }
}

/// Gizmo interaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// `persistent` or `transitory`
    pub default_mode: String,
    /// Multiplier applied on top of the zoom-independent gizmo size
    pub gizmo_scale: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            default_mode: "persistent".to_string(),
            gizmo_scale: 1.0,
        }
    }
}

/// Default key bindings.
pub fn default_keymap() -> BTreeMap<String, String> {
    let mut keymap = BTreeMap::new();
    keymap.insert("Escape".to_string(), "command:abort".to_string());
    keymap.insert("Enter".to_string(), "command:finish".to_string());
    keymap
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingSettings,
    pub history: HistorySettings,
    pub event_bus: EventBusSettings,
    pub interaction: InteractionSettings,
    /// Key to command identifier
    pub keymap: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingSettings::default(),
            history: HistorySettings::default(),
            event_bus: EventBusSettings::default(),
            interaction: InteractionSettings::default(),
            keymap: default_keymap(),
        }
    }
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/solidkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".to_string())
        })?;
        Ok(dir.join("solidkit").join("config.toml"))
    }

    /// Load config from file (JSON or TOML, by extension)
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

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML, by extension), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.logging.level.trim().is_empty() {
            return Err(out_of_range("logging.level", &self.logging.level));
        }

        if self.history.max_depth == 0 {
            return Err(out_of_range("history.max_depth", self.history.max_depth));
        }

        if self.event_bus.channel_capacity == 0 {
            return Err(out_of_range(
                "event_bus.channel_capacity",
                self.event_bus.channel_capacity,
            ));
        }
        if self.event_bus.enable_history && self.event_bus.max_history_size == 0 {
            return Err(out_of_range(
                "event_bus.max_history_size",
                self.event_bus.max_history_size,
            ));
        }

        if !INTERACTION_MODES.contains(&self.interaction.default_mode.as_str()) {
            return Err(ConfigError::UnknownMode(
                self.interaction.default_mode.clone(),
            ));
        }
        if !(self.interaction.gizmo_scale.is_finite() && self.interaction.gizmo_scale > 0.0) {
            return Err(out_of_range(
                "interaction.gizmo_scale",
                self.interaction.gizmo_scale,
            ));
        }

        for (key, command) in &self.keymap {
            if key.trim().is_empty() || command.trim().is_empty() {
                return Err(ConfigError::InvalidBinding {
                    key: key.clone(),
                    command: command.clone(),
                });
            }
        }

        Ok(())
    }

    /// Overlay the sections of `other` that differ from the defaults.
    ///
    /// Key bindings are merged entry by entry.
    pub fn merge(&mut self, other: &Config) {
        let defaults = Config::default();
        if other.logging != defaults.logging {
            self.logging = other.logging.clone();
        }
        if other.history != defaults.history {
            self.history = other.history.clone();
        }
        if other.event_bus != defaults.event_bus {
            self.event_bus = other.event_bus.clone();
        }
        if other.interaction != defaults.interaction {
            self.interaction = other.interaction.clone();
        }
        for (key, command) in &other.keymap {
            self.keymap.insert(key.clone(), command.clone());
        }
    }
}

fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}
