//! Configuration file handling for ~/.fieldmerge/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use super::settings::*;

use crate::overlay::{OverlaySettings, SliverClassifier};
use crate::priority::PriorityTable;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.fieldmerge/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render the configuration as commented INI text, as `save_to` writes it.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Create a default config file at `path` if none exists.
    ///
    /// Returns `true` if a file was created.
    pub fn ensure_exists_at(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    /// Built-in priority table with this file's `[priority]` overrides applied.
    pub fn priority_table(&self) -> PriorityTable {
        let mut table = PriorityTable::builtin();
        for (region, codes) in &self.priority.overrides {
            table.set(region.clone(), codes.clone());
        }
        table
    }

    /// Overlay tunables from the `[cleaning]` section.
    pub fn overlay_settings(&self) -> OverlaySettings {
        OverlaySettings {
            classifier: SliverClassifier::new(
                self.cleaning.ratio_threshold,
                self.cleaning.min_area,
            ),
            repair_buffer: self.cleaning.repair_buffer,
        }
    }
}

/// Get the path to the config directory (~/.fieldmerge).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fieldmerge")
}

/// Get the path to the config file (~/.fieldmerge/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
