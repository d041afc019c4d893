//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [paths] section
    if let Some(section) = ini.section(Some("paths")) {
        if let Some(v) = non_empty(section.get("input_dir")) {
            config.paths.input_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("output_dir")) {
            config.paths.output_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("tiles")) {
            config.paths.tiles = Some(expand_tilde(v));
        }
        if let Some(v) = non_empty(section.get("error_log")) {
            config.paths.error_log = expand_tilde(v);
        }
    }

    // [cleaning] section
    if let Some(section) = ini.section(Some("cleaning")) {
        if let Some(v) = section.get("ratio_threshold") {
            let parsed = parse_f64("cleaning", "ratio_threshold", v)?;
            if !(parsed > 0.0 && parsed <= 1.0) {
                return Err(invalid(
                    "cleaning",
                    "ratio_threshold",
                    v,
                    "must be greater than 0 and at most 1",
                ));
            }
            config.cleaning.ratio_threshold = parsed;
        }
        if let Some(v) = section.get("min_area") {
            config.cleaning.min_area = parse_non_negative("cleaning", "min_area", v)?;
        }
        if let Some(v) = section.get("repair_buffer") {
            let parsed = parse_f64("cleaning", "repair_buffer", v)?;
            if parsed <= 0.0 {
                return Err(invalid(
                    "cleaning",
                    "repair_buffer",
                    v,
                    "must be a positive distance",
                ));
            }
            config.cleaning.repair_buffer = parsed;
        }
        if let Some(v) = section.get("strict_min_area") {
            config.cleaning.strict_min_area =
                parse_non_negative("cleaning", "strict_min_area", v)?;
        }
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = section.get("id_field") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("tiles", "id_field", v, "must not be empty"));
            }
            config.tiles.id_field = v.to_string();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    // [priority] section: REGION = CODE1, CODE2, ...
    if let Some(section) = ini.section(Some("priority")) {
        for (region, codes) in section.iter() {
            let parsed: Vec<String> = codes
                .split(',')
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect();
            if parsed.is_empty() {
                return Err(invalid(
                    "priority",
                    region,
                    codes,
                    "expected a comma-separated list of source codes",
                ));
            }
            config
                .priority
                .overrides
                .insert(region.trim().to_uppercase(), parsed);
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_f64(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(section, key, value, "expected a number"))
}

fn parse_non_negative(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let parsed = parse_f64(section, key, value)?;
    if parsed < 0.0 {
        return Err(invalid(section, key, value, "must not be negative"));
    }
    Ok(parsed)
}

/// Expand a leading `~/` to the user's home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
