//! Tile pyramid addressing and tree shape.
//!
//! - [`TileAddress`] names a node of the quadtree
//! - [`TileTree`] answers which nodes the world actually needs
//! - [`SparseTileTree`] is a tile tree built from a set of leaf tiles

mod address;
mod tree;

pub use address::{TileAddress, TileAddressError, MAX_DEPTH, ROOT_NAME};
pub use tree::{SparseTileTree, TileTree, TileTreeError};
