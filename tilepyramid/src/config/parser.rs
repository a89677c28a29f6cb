//! INI parsing: maps `Ini` sections and keys onto [`ConfigFile`] fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::{is_valid_tile_size, ConfigFile, MAX_TILE_SIZE, MIN_TILE_SIZE};
use crate::tile::MAX_DEPTH;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("threads") {
            let v = v.trim();
            if v.is_empty() || v.eq_ignore_ascii_case("auto") {
                config.render.threads = None;
            } else {
                let threads: usize =
                    parse_number("render", "threads", v, "expected a positive integer or 'auto'")?;
                if threads == 0 {
                    return Err(invalid("render", "threads", v, "must be at least 1"));
                }
                config.render.threads = Some(threads);
            }
        }
        if let Some(v) = section.get("batch_depth") {
            let reason = format!("expected an integer between 0 and {}", MAX_DEPTH);
            let depth: u8 = parse_number("render", "batch_depth", v, &reason)?;
            if depth > MAX_DEPTH {
                return Err(invalid("render", "batch_depth", v, &reason));
            }
            config.render.batch_depth = depth;
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("tile_size") {
            let reason = format!(
                "expected an even number between {} and {}",
                MIN_TILE_SIZE, MAX_TILE_SIZE
            );
            let size: u32 = parse_number("output", "tile_size", v, &reason)?;
            if !is_valid_tile_size(size) {
                return Err(invalid("output", "tile_size", v, &reason));
            }
            config.output.tile_size = size;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
