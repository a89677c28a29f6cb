//! Tile rendering collaborator.
//!
//! The dispatcher does not know how pixels are produced. It drives a
//! [`TileRenderer`] that knows how to render a leaf tile from world data and
//! how to composite a parent from its already-rendered children.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use tilepyramid::render::{RenderError, TileRenderer};
//! use tilepyramid::tile::TileAddress;
//!
//! struct NullRenderer;
//!
//! impl TileRenderer for NullRenderer {
//!     fn render_leaf(&self, _tile: &TileAddress) -> Result<(), RenderError> {
//!         Ok(())
//!     }
//!
//!     fn composite_parent(
//!         &self,
//!         _tile: &TileAddress,
//!         _skip_children: &BTreeSet<TileAddress>,
//!     ) -> Result<(), RenderError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::tile::TileAddress;

/// Errors reported by a [`TileRenderer`].
#[derive(Debug, Error)]
pub enum RenderError {
    /// Reading or writing tile output failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A child tile needed for compositing could not be found.
    #[error("Child tile {child} of {tile} is missing")]
    MissingChild {
        tile: TileAddress,
        child: TileAddress,
    },

    /// Image encoding or decoding failed.
    #[error("Image error: {0}")]
    Image(String),

    /// Any other rendering failure.
    #[error("Render failed: {0}")]
    Failed(String),
}

/// Produces tile output for the dispatcher.
///
/// Both operations are called from worker threads, possibly concurrently for
/// different tiles, so implementations must be `Send + Sync`. Each call is
/// expected to be all-or-nothing: on `Ok` the tile's output is durable and
/// readable by a later `composite_parent` call.
pub trait TileRenderer: Send + Sync {
    /// Render a leaf tile directly from world data.
    fn render_leaf(&self, tile: &TileAddress) -> Result<(), RenderError>;

    /// Composite `tile` from its four children, ignoring any child listed in
    /// `skip_children` (those children have no content).
    fn composite_parent(
        &self,
        tile: &TileAddress,
        skip_children: &BTreeSet<TileAddress>,
    ) -> Result<(), RenderError>;
}
