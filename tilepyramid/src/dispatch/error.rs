//! Dispatcher error types.

use thiserror::Error;

use crate::render::RenderError;
use crate::tile::TileAddress;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that abort a render run.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The renderer failed on a tile. Queued work was discarded.
    #[error("Rendering tile {tile} failed: {source}")]
    Render {
        tile: TileAddress,
        #[source]
        source: RenderError,
    },

    /// A worker thread could not be started.
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A worker thread panicked.
    #[error("Worker thread {worker} panicked")]
    WorkerPanicked { worker: usize },
}
