//! Region and input layer discovery.

use std::fs;
use std::path::Path;

use super::RegionError;
use crate::priority::LayerInput;

/// Extension of input and output datasets.
pub const DATASET_EXTENSION: &str = "geojson";

/// Lists the input layers of one region directory.
///
/// Every `*.geojson` file is an input. Its source code is the final
/// `_`-separated token of the file stem, upper-cased, so
/// `tx_2019_clu.geojson` has code `CLU`. Results are sorted by file name.
pub fn discover_inputs(dir: &Path) -> Result<Vec<LayerInput>, RegionError> {
    if !dir.is_dir() {
        return Err(RegionError::RegionNotFound(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| RegionError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| RegionError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?
            .path();
        if !path.is_file() || !has_dataset_extension(&path) {
            continue;
        }
        if let Some(code) = source_code_of(&path) {
            inputs.push(LayerInput::new(path, code));
        }
    }

    inputs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(inputs)
}

/// Lists region directories under `input_dir`, sorted by name.
pub fn list_regions(input_dir: &Path) -> Result<Vec<String>, RegionError> {
    let entries = fs::read_dir(input_dir).map_err(|e| RegionError::Io {
        path: input_dir.to_path_buf(),
        source: e,
    })?;

    let mut regions: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    regions.sort();
    Ok(regions)
}

/// Source code encoded in a dataset file name.
pub fn source_code_of(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let code = stem.rsplit('_').next()?.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_uppercase())
    }
}

fn has_dataset_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(DATASET_EXTENSION))
}
