//! Configuration file handling.
//!
//! Settings live in an INI file (default: `<config dir>/tilepyramid/config.ini`):
//!
//! ```ini
//! [render]
//! threads = 8
//! batch_depth = 0
//!
//! [output]
//! directory = tiles
//! tile_size = 256
//!
//! [logging]
//! directory = logs
//! file = tilepyramid.log
//! ```
//!
//! Missing files and missing keys fall back to defaults.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    is_valid_tile_size, ConfigFile, LoggingSettings, OutputSettings, RenderSettings,
    DEFAULT_LOG_DIR, DEFAULT_LOG_FILE, DEFAULT_OUTPUT_DIR, DEFAULT_TILE_SIZE, MAX_TILE_SIZE,
    MIN_TILE_SIZE,
};
