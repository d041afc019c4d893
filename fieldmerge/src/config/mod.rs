//! Configuration for fieldmerge.
//!
//! Settings are read from an INI file (default `~/.fieldmerge/config.ini`).
//! A missing file yields the defaults; keys present in the file overlay
//! them.
//!
//! ```ini
//! [paths]
//! input_dir = ~/data/regions
//! output_dir = ~/data/clean
//! tiles = ~/data/mgrs_tiles.geojson
//!
//! [cleaning]
//! ratio_threshold = 0.05
//! min_area = 2025
//!
//! [priority]
//! TX = CLU, NLCD
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CleaningSettings, ConfigFile, LoggingSettings, PathsSettings, PrioritySettings,
    TilesSettings,
};
