//! Tile tree shape and the required-tile predicate.
//!
//! The world being rendered rarely fills the whole quadtree. A [`TileTree`]
//! describes which addresses actually carry content so the dispatcher only
//! waits on children that will exist.

use std::collections::HashMap;

use thiserror::Error;

use super::address::{TileAddress, TileAddressError, MAX_DEPTH};

/// Errors raised while building a tile tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileTreeError {
    /// Requested tree depth is beyond what addresses can express.
    #[error("Tree depth {0} exceeds maximum of {max}", max = MAX_DEPTH)]
    DepthTooLarge(u8),

    /// A leaf was supplied at the wrong depth.
    #[error("Leaf tile {tile} has depth {depth}, expected {expected}")]
    LeafDepthMismatch {
        tile: TileAddress,
        depth: u8,
        expected: u8,
    },

    /// A grid position could not be turned into an address.
    #[error(transparent)]
    Address(#[from] TileAddressError),
}

/// Read-only description of the tile pyramid being rendered.
///
/// Implementations must be `Send + Sync`: every worker thread and the
/// dispatcher query the same tree concurrently.
pub trait TileTree: Send + Sync {
    /// Depth of the leaf level. Zero means the world is a single tile.
    fn max_depth(&self) -> u8;

    /// Does the world produce content for this address?
    ///
    /// A composite tile is needed when at least one needed leaf lies below it.
    fn is_needed(&self, tile: &TileAddress) -> bool;

    /// Number of needed leaf tiles in the subtree rooted at `tile`.
    ///
    /// The default walks the subtree; implementations with precomputed
    /// counts should override it.
    fn render_tiles_under(&self, tile: &TileAddress) -> u64 {
        if !self.is_needed(tile) {
            return 0;
        }
        if tile.depth() >= self.max_depth() {
            return 1;
        }
        tile.children()
            .iter()
            .map(|child| self.render_tiles_under(child))
            .sum()
    }

    /// Total number of needed leaf tiles.
    fn render_tile_count(&self) -> u64 {
        self.render_tiles_under(&TileAddress::ROOT)
    }

    /// Every needed address at `depth`, sorted.
    fn needed_at_depth(&self, depth: u8) -> Vec<TileAddress> {
        let mut found = Vec::new();
        let mut stack = vec![TileAddress::ROOT];
        while let Some(tile) = stack.pop() {
            if !self.is_needed(&tile) {
                continue;
            }
            if tile.depth() == depth {
                found.push(tile);
            } else if tile.depth() < depth {
                stack.extend(tile.children());
            }
        }
        found.sort();
        found
    }
}

/// Tile tree built from an explicit set of leaf tiles.
///
/// All ancestors of the supplied leaves are needed composite tiles. Leaf
/// counts for every needed node are computed once up front so
/// [`TileTree::render_tiles_under`] is a map lookup.
#[derive(Debug, Clone)]
pub struct SparseTileTree {
    max_depth: u8,
    /// Needed leaves below each needed address (leaves map to 1).
    leaf_counts: HashMap<TileAddress, u64>,
}

impl SparseTileTree {
    /// Builds a tree whose leaf level is `max_depth` from the given leaves.
    ///
    /// Duplicate leaves are collapsed.
    pub fn new<I>(max_depth: u8, leaves: I) -> Result<Self, TileTreeError>
    where
        I: IntoIterator<Item = TileAddress>,
    {
        if max_depth > MAX_DEPTH {
            return Err(TileTreeError::DepthTooLarge(max_depth));
        }

        let mut leaf_counts: HashMap<TileAddress, u64> = HashMap::new();
        for leaf in leaves {
            if leaf.depth() != max_depth {
                return Err(TileTreeError::LeafDepthMismatch {
                    tile: leaf,
                    depth: leaf.depth(),
                    expected: max_depth,
                });
            }
            if leaf_counts.contains_key(&leaf) {
                continue;
            }

            let mut current = Some(leaf);
            while let Some(tile) = current {
                *leaf_counts.entry(tile).or_insert(0) += 1;
                current = tile.parent();
            }
        }

        Ok(Self {
            max_depth,
            leaf_counts,
        })
    }

    /// Builds a tree from `(x, y)` grid positions on the leaf level.
    pub fn from_positions<I>(max_depth: u8, positions: I) -> Result<Self, TileTreeError>
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        if max_depth > MAX_DEPTH {
            return Err(TileTreeError::DepthTooLarge(max_depth));
        }
        let leaves = positions
            .into_iter()
            .map(|(x, y)| TileAddress::from_position(x, y, max_depth))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(max_depth, leaves)
    }

    /// Number of needed tiles on every level, leaves included.
    pub fn needed_tile_count(&self) -> usize {
        self.leaf_counts.len()
    }

    /// Returns true if no tile is needed at all.
    pub fn is_empty(&self) -> bool {
        self.leaf_counts.is_empty()
    }
}

impl TileTree for SparseTileTree {
    fn max_depth(&self) -> u8 {
        self.max_depth
    }

    fn is_needed(&self, tile: &TileAddress) -> bool {
        self.leaf_counts.contains_key(tile)
    }

    fn render_tiles_under(&self, tile: &TileAddress) -> u64 {
        self.leaf_counts.get(tile).copied().unwrap_or(0)
    }
}
