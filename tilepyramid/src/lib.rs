//! TilePyramid - multi-resolution tile pyramid rendering
//!
//! Renders a sparse world into a quadtree of image tiles for pan/zoom
//! viewing. Leaf tiles come straight from world data; every other tile is
//! composited from up to four children, so tiles must be produced bottom-up.
//!
//! The [`dispatch`] module schedules that work across a pool of threads.
//! Pixel work is delegated to a [`render::TileRenderer`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilepyramid::dispatch::{DispatchConfig, Dispatcher};
//! use tilepyramid::progress::LogProgress;
//! use tilepyramid::tile::SparseTileTree;
//!
//! let tree = SparseTileTree::from_positions(10, world_positions)?;
//! let dispatcher = Dispatcher::new(DispatchConfig::default());
//! let summary = dispatcher.dispatch(Arc::new(tree), renderer, &LogProgress::default())?;
//! ```

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod progress;
pub mod render;
pub mod tile;
