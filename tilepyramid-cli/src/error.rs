//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilepyramid::config::ConfigFileError;
use tilepyramid::dispatch::DispatchError;
use tilepyramid::tile::TileTreeError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(ConfigFileError),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Failed to build the world description
    World(TileTreeError),
    /// Render run failed
    Render(DispatchError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Render(DispatchError::Render { .. }) => {
                eprintln!();
                eprintln!("Tiles rendered before the failure were kept.");
                eprintln!("Check that the output directory is writable and has free space.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Fix the value in the configuration file or pass it on the command line.");
            }
            _ => {}
        }

        process::exit(match self {
            CliError::InvalidArgument(_) | CliError::Config(_) => 2,
            _ => 1,
        })
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::World(e) => write!(f, "Failed to build world: {}", e),
            CliError::Render(e) => write!(f, "Render failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::World(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::InvalidArgument(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<TileTreeError> for CliError {
    fn from(e: TileTreeError) -> Self {
        CliError::World(e)
    }
}

impl From<DispatchError> for CliError {
    fn from(e: DispatchError) -> Self {
        CliError::Render(e)
    }
}
