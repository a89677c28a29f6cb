//! Init command - write a default configuration file.

use tilepyramid::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// An existing file is loaded and rewritten, so unknown keys are dropped
/// but every known value is kept.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?;
    config.save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize TilePyramid settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
