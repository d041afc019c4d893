//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let tiles = config
        .paths
        .tiles
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    let priority: String = config
        .priority
        .overrides
        .iter()
        .map(|(region, codes)| format!("{} = {}\n", region, codes.join(", ")))
        .collect();

    format!(
        r#"[paths]
; Directory with one sub-directory of source layers per region.
; Layer files are named <anything>_<SOURCECODE>.geojson
input_dir = {}
; Region datasets (<region>.geojson) and partitions (<region>/<tile>_<code>.geojson)
output_dir = {}
; Tile boundary dataset, required by clean and batch
tiles = {}
; Regions that failed are appended here
error_log = {}

[cleaning]
; Polsby-Popper compactness below which a feature is a sliver (default: 0.05)
ratio_threshold = {}
; Features smaller than this are eliminated, in square metres (default: 2025)
min_area = {}
; Contraction distance applied to the base when a difference fails (default: 0.1)
repair_buffer = {}
; Strict variant removes input parts smaller than this (default: 2023)
strict_min_area = {}

[tiles]
; Attribute holding the tile identifier in the tile dataset
id_field = {}

[logging]
; Log file path (default: ~/.fieldmerge/fieldmerge.log)
file = {}

[priority]
; Source order per region, highest priority first. Entries here replace the
; built-in ordering for that region, e.g.
; TX = CLU, NLCD
{}"#,
        path_to_string(&config.paths.input_dir),
        path_to_string(&config.paths.output_dir),
        tiles,
        path_to_string(&config.paths.error_log),
        config.cleaning.ratio_threshold,
        config.cleaning.min_area,
        config.cleaning.repair_buffer,
        config.cleaning.strict_min_area,
        config.tiles.id_field,
        path_to_string(&config.logging.file),
        priority,
    )
}

/// Render a path, abbreviating the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
