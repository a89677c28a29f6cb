//! TilePyramid CLI - Command-line interface
//!
//! Renders synthetic worlds into PNG tile pyramids using the TilePyramid
//! library.

mod commands;
mod error;
mod progress;
mod renderer;
mod world;

use clap::{Parser, Subcommand};

use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "tilepyramid")]
#[command(about = "Render multi-resolution tile pyramids", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with default values
    Init,
    /// Render a tile pyramid for a generated world
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Render(args) => commands::render::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
