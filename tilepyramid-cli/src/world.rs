//! Synthetic world generation.
//!
//! Produces the set of occupied leaf positions for a `2^depth` grid. Real
//! worlds would come from a save file; these shapes exercise sparse and dense
//! pyramids for benchmarking and demos.

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tilepyramid::tile::{SparseTileTree, TileTreeError};

/// Shape of the generated world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorldShape {
    /// Every leaf is present
    Full,
    /// Leaves inside a centered disc
    Disc,
    /// Leaves picked at random with the given density
    Scatter,
}

/// Parameters for [`generate`].
#[derive(Debug, Clone)]
pub struct WorldParams {
    pub shape: WorldShape,
    pub depth: u8,
    pub density: f64,
    pub seed: u64,
}

/// Occupied leaf positions for `params`.
pub fn positions(params: &WorldParams) -> Vec<(u64, u64)> {
    let size = 1u64 << params.depth;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let density = params.density.clamp(0.0, 1.0);

    let center = size as f64 / 2.0;
    let radius_sq = center * center;

    let mut out = Vec::new();
    for y in 0..size {
        for x in 0..size {
            let keep = match params.shape {
                WorldShape::Full => true,
                WorldShape::Disc => {
                    let dx = x as f64 + 0.5 - center;
                    let dy = y as f64 + 0.5 - center;
                    dx * dx + dy * dy <= radius_sq
                }
                WorldShape::Scatter => rng.random_bool(density),
            };
            if keep {
                out.push((x, y));
            }
        }
    }
    out
}

/// Builds the needed-tile tree for `params`.
pub fn generate(params: &WorldParams) -> Result<SparseTileTree, TileTreeError> {
    SparseTileTree::from_positions(params.depth, positions(params))
}
