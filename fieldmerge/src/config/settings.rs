//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Input, output and auxiliary dataset locations
    pub paths: PathsSettings,
    /// Sliver and repair thresholds
    pub cleaning: CleaningSettings,
    /// Tile dataset schema
    pub tiles: TilesSettings,
    /// Logging settings
    pub logging: LoggingSettings,
    /// Per-region source priority overrides
    pub priority: PrioritySettings,
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq)]
pub struct PathsSettings {
    /// Directory holding one sub-directory of source layers per region
    pub input_dir: PathBuf,
    /// Directory receiving region datasets and partition directories
    pub output_dir: PathBuf,
    /// Tile boundary dataset (required for clean and batch)
    pub tiles: Option<PathBuf>,
    /// Append-only log of failed regions
    pub error_log: PathBuf,
}

/// Overlay cleaning thresholds, all in map units of the working projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningSettings {
    /// Compactness below which a feature is a sliver
    pub ratio_threshold: f64,
    /// Area below which a feature is eliminated
    pub min_area: f64,
    /// Contraction distance applied to the base after a failed difference
    pub repair_buffer: f64,
    /// Smallest input part kept by the strict cleaning variant
    pub strict_min_area: f64,
}

/// Tile dataset schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesSettings {
    /// Attribute holding the tile identifier
    pub id_field: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

/// Priority overrides from the `[priority]` section.
///
/// Each entry replaces (or adds) the built-in ordering for one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrioritySettings {
    pub overrides: BTreeMap<String, Vec<String>>,
}
