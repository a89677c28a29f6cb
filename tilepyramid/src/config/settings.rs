//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

use crate::dispatch::{default_thread_count, DispatchConfig, DEFAULT_BATCH_DEPTH};

/// Default output directory for rendered tiles.
pub const DEFAULT_OUTPUT_DIR: &str = "tiles";

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Smallest accepted tile edge length (must stay divisible by 2).
pub const MIN_TILE_SIZE: u32 = 2;

/// Largest accepted tile edge length.
pub const MAX_TILE_SIZE: u32 = 4096;

/// Returns true if `size` is an accepted tile edge length.
///
/// Composites halve each child, so the size must be even.
pub fn is_valid_tile_size(size: u32) -> bool {
    (MIN_TILE_SIZE..=MAX_TILE_SIZE).contains(&size) && size % 2 == 0
}

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilepyramid.log";

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Dispatcher settings
    pub render: RenderSettings,
    /// Tile output settings
    pub output: OutputSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Worker threads; `None` uses the number of available cores.
    pub threads: Option<usize>,
    /// Levels rendered per seeded work item.
    pub batch_depth: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            threads: None,
            batch_depth: DEFAULT_BATCH_DEPTH,
        }
    }
}

impl RenderSettings {
    /// Builds the dispatcher configuration for these settings.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_threads(self.threads.unwrap_or_else(default_thread_count))
            .with_batch_depth(self.batch_depth)
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Directory rendered tiles are written to.
    pub directory: PathBuf,
    /// Tile edge length in pixels.
    pub tile_size: u32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Directory for log files.
    pub directory: PathBuf,
    /// Log file name.
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_size_validation() {
        assert!(is_valid_tile_size(DEFAULT_TILE_SIZE));
        assert!(is_valid_tile_size(MIN_TILE_SIZE));
        assert!(is_valid_tile_size(MAX_TILE_SIZE));
        assert!(!is_valid_tile_size(0));
        assert!(!is_valid_tile_size(5));
        assert!(!is_valid_tile_size(MAX_TILE_SIZE + 2));
    }
}
