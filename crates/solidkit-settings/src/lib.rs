//! SolidKit Settings Crate
//!
//! Loads, validates and saves the application configuration.

pub mod config;
pub mod error;

pub use config::{
    default_keymap, Config, EventBusSettings, HistorySettings, InteractionSettings,
    LoggingSettings, INTERACTION_MODES,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
