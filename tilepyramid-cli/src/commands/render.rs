//! Render command - build a tile pyramid for a synthetic world.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tilepyramid::config::{
    config_file_path, is_valid_tile_size, ConfigFile, MAX_TILE_SIZE, MIN_TILE_SIZE,
};
use tilepyramid::dispatch::Dispatcher;
use tilepyramid::logging::init_logging;
use tilepyramid::tile::TileTree;
use tracing::info;

use crate::error::CliError;
use crate::progress::BarProgress;
use crate::renderer::PngTileRenderer;
use crate::world::{self, WorldShape, WorldParams};

/// Deepest world the generator accepts.
pub const MAX_WORLD_DEPTH: u8 = 16;

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Leaf level of the pyramid (grid is 2^depth tiles wide)
    #[arg(long, default_value_t = 6)]
    pub depth: u8,

    /// World shape to generate
    #[arg(long, value_enum, default_value_t = WorldShape::Disc)]
    pub shape: WorldShape,

    /// Fraction of leaves present for the scatter shape
    #[arg(long, default_value_t = 0.3)]
    pub density: f64,

    /// Random seed for the scatter shape
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worker threads (overrides config)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Levels rendered per seeded work item (overrides config)
    #[arg(long)]
    pub batch_depth: Option<u8>,

    /// Tile edge length in pixels (overrides config)
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

impl RenderArgs {
    /// Applies command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut ConfigFile) -> Result<(), CliError> {
        if let Some(dir) = &self.output {
            config.output.directory = dir.clone();
        }
        if let Some(threads) = self.threads {
            if threads == 0 {
                return Err(CliError::InvalidArgument(
                    "--threads must be at least 1".to_string(),
                ));
            }
            config.render.threads = Some(threads);
        }
        if let Some(batch_depth) = self.batch_depth {
            config.render.batch_depth = batch_depth;
        }
        if let Some(size) = self.tile_size {
            if !is_valid_tile_size(size) {
                return Err(CliError::InvalidArgument(format!(
                    "--tile-size must be an even number between {} and {}",
                    MIN_TILE_SIZE, MAX_TILE_SIZE
                )));
            }
            config.output.tile_size = size;
        }
        Ok(())
    }

    fn world_params(&self) -> Result<WorldParams, CliError> {
        if self.depth > MAX_WORLD_DEPTH {
            return Err(CliError::InvalidArgument(format!(
                "--depth must be at most {}",
                MAX_WORLD_DEPTH
            )));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(CliError::InvalidArgument(
                "--density must be between 0 and 1".to_string(),
            ));
        }
        Ok(WorldParams {
            shape: self.shape,
            depth: self.depth,
            density: self.density,
            seed: self.seed,
        })
    }
}

/// Run the render command.
pub fn run(args: RenderArgs) -> Result<(), CliError> {
    let config_path = args.config.clone().unwrap_or_else(config_file_path);
    let mut config = ConfigFile::load_from(&config_path)?;
    args.apply(&mut config)?;
    let params = args.world_params()?;

    let _logging_guard = init_logging(&config.logging.directory, &config.logging.file)
        .map_err(CliError::LoggingInit)?;

    let tree = world::generate(&params)?;
    info!(
        shape = ?params.shape,
        depth = params.depth,
        leaves = tree.render_tile_count(),
        tiles = tree.needed_tile_count(),
        "World generated"
    );

    let tree = Arc::new(tree);
    let renderer = Arc::new(PngTileRenderer::new(
        config.output.directory.clone(),
        config.output.tile_size,
        tree.as_ref(),
    ));

    let dispatcher = Dispatcher::new(config.render.dispatch_config());
    println!(
        "Rendering {} tiles to {} with {} threads",
        tree.needed_tile_count(),
        config.output.directory.display(),
        dispatcher.config().threads
    );

    let summary = if args.quiet {
        dispatcher.dispatch(tree, renderer, &tilepyramid::progress::NoopProgress)?
    } else {
        dispatcher.dispatch(tree, renderer, &BarProgress::new())?
    };

    println!();
    println!("Rendered tiles:  {}", summary.rendered_tiles);
    println!("Total tiles:     {}", summary.completed_tiles);
    println!(
        "Work items:      {} render, {} composite",
        summary.render_items, summary.composite_items
    );
    println!("Elapsed:         {:.2?}", summary.elapsed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RenderArgs {
        RenderArgs {
            depth: 3,
            shape: WorldShape::Full,
            density: 0.5,
            seed: 1,
            output: None,
            threads: None,
            batch_depth: None,
            tile_size: None,
            config: None,
            quiet: true,
        }
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut a = args();
        a.output = Some(PathBuf::from("/tmp/out"));
        a.threads = Some(3);
        a.batch_depth = Some(0);
        a.tile_size = Some(64);

        let mut config = ConfigFile::default();
        a.apply(&mut config).unwrap();

        assert_eq!(config.output.directory, PathBuf::from("/tmp/out"));
        assert_eq!(config.render.threads, Some(3));
        assert_eq!(config.render.batch_depth, 0);
        assert_eq!(config.output.tile_size, 64);
    }

    #[test]
    fn test_absent_overrides_keep_config() {
        let mut config = ConfigFile::default();
        args().apply(&mut config).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let mut a = args();
        a.threads = Some(0);
        assert!(a.apply(&mut ConfigFile::default()).is_err());

        let mut a = args();
        a.tile_size = Some(1);
        assert!(a.apply(&mut ConfigFile::default()).is_err());

        let mut a = args();
        a.tile_size = Some(5);
        let mut config = ConfigFile::default();
        assert!(a.apply(&mut config).is_err());
        assert_eq!(config.output.tile_size, ConfigFile::default().output.tile_size);
    }

    #[test]
    fn test_world_params_validation() {
        let mut a = args();
        a.depth = MAX_WORLD_DEPTH + 1;
        assert!(a.world_params().is_err());

        let mut a = args();
        a.density = 1.5;
        assert!(a.world_params().is_err());

        assert_eq!(args().world_params().unwrap().depth, 3);
    }
}
