//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::settings::*;
use crate::overlay::{
    DEFAULT_MIN_AREA, DEFAULT_RATIO_THRESHOLD, DEFAULT_REPAIR_BUFFER, DEFAULT_STRICT_MIN_AREA,
};
use crate::tiles::DEFAULT_TILE_ID_FIELD;

// =============================================================================
// Path defaults
// =============================================================================

/// Default input directory name under the config directory.
pub const DEFAULT_INPUT_DIR_NAME: &str = "input";

/// Default output directory name under the config directory.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "output";

/// Default error log file name.
pub const DEFAULT_ERROR_LOG_NAME: &str = "errors.log";

/// Default application log file name.
pub const DEFAULT_LOG_FILE_NAME: &str = "fieldmerge.log";

// =============================================================================
// Cleaning defaults
// =============================================================================

/// Default compactness threshold for sliver detection.
pub const DEFAULT_CLEANING_RATIO_THRESHOLD: f64 = DEFAULT_RATIO_THRESHOLD;

/// Default minimum feature area (square metres).
pub const DEFAULT_CLEANING_MIN_AREA: f64 = DEFAULT_MIN_AREA;

/// Default contraction distance for the difference repair (metres).
pub const DEFAULT_CLEANING_REPAIR_BUFFER: f64 = DEFAULT_REPAIR_BUFFER;

/// Default minimum input part area for the strict variant (square metres).
pub const DEFAULT_CLEANING_STRICT_MIN_AREA: f64 = DEFAULT_STRICT_MIN_AREA;

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            paths: PathsSettings {
                input_dir: config_dir.join(DEFAULT_INPUT_DIR_NAME),
                output_dir: config_dir.join(DEFAULT_OUTPUT_DIR_NAME),
                tiles: None,
                error_log: config_dir.join(DEFAULT_ERROR_LOG_NAME),
            },
            cleaning: CleaningSettings {
                ratio_threshold: DEFAULT_CLEANING_RATIO_THRESHOLD,
                min_area: DEFAULT_CLEANING_MIN_AREA,
                repair_buffer: DEFAULT_CLEANING_REPAIR_BUFFER,
                strict_min_area: DEFAULT_CLEANING_STRICT_MIN_AREA,
            },
            tiles: TilesSettings {
                id_field: DEFAULT_TILE_ID_FIELD.to_string(),
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE_NAME),
            },
            priority: PrioritySettings::default(),
        }
    }
}
