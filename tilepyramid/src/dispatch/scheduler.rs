//! Dependency-ordered tile dispatcher.
//!
//! The [`Dispatcher`] renders a tile pyramid bottom-up on a fixed pool of
//! worker threads:
//!
//! ```text
//! SEEDING ──► DRAINING ──► DONE
//!
//! SEEDING   queue one render item per needed tile at the seed depth
//! DRAINING  for each result: record completed tiles; when every needed
//!           child of a parent is complete, queue the parent as priority
//!           composite work; when the root completes, close the channel
//! DONE      channel drained, workers joined
//! ```
//!
//! Only the dispatcher thread touches the completed-tile set, so it needs no
//! locking. Workers and dispatcher share nothing but the [`WorkChannel`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilepyramid::dispatch::{DispatchConfig, Dispatcher};
//! use tilepyramid::progress::LogProgress;
//!
//! let dispatcher = Dispatcher::new(DispatchConfig::default().with_threads(8));
//! let summary = dispatcher.dispatch(tree, renderer, &LogProgress::default())?;
//! println!("rendered {} tiles", summary.rendered_tiles);
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::channel::WorkChannel;
use super::error::{DispatchError, DispatchResult};
use super::work::{WorkFailure, WorkItem};
use super::worker::{Worker, WorkerStats};
use crate::progress::ProgressSink;
use crate::render::TileRenderer;
use crate::tile::{TileAddress, TileTree};

// =============================================================================
// Configuration
// =============================================================================

/// Default number of levels rendered inside a single seeded work item.
pub const DEFAULT_BATCH_DEPTH: u8 = 0;

/// Number of worker threads used when none is configured.
pub fn default_thread_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Configuration for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Number of worker threads (at least 1).
    pub threads: usize,

    /// Levels above the leaf level at which work is seeded.
    ///
    /// With 0 every leaf is its own work item. With `n` each seeded item
    /// renders a subtree `n` levels high inside one worker.
    pub batch_depth: u8,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            threads: default_thread_count(),
            batch_depth: DEFAULT_BATCH_DEPTH,
        }
    }
}

impl DispatchConfig {
    /// Sets the number of worker threads (clamped to at least 1).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Sets the batch depth.
    pub fn with_batch_depth(mut self, batch_depth: u8) -> Self {
        self.batch_depth = batch_depth;
        self
    }

    /// Depth at which work is seeded for a tree of `max_depth` levels.
    pub fn seed_depth(&self, max_depth: u8) -> u8 {
        max_depth.saturating_sub(self.batch_depth)
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Leaf-tile equivalents reported as rendered.
    pub rendered_tiles: u64,
    /// Seeded render work items.
    pub render_items: usize,
    /// Composite work items scheduled.
    pub composite_items: usize,
    /// Tiles recorded as complete, across all levels touched by results.
    pub completed_tiles: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

// =============================================================================
// Completion Tracking
// =============================================================================

/// Completed tiles and already-scheduled parents.
///
/// Owned by the dispatcher thread only.
#[derive(Debug, Default)]
struct CompletionTracker {
    completed: HashSet<TileAddress>,
    scheduled: HashSet<TileAddress>,
}

impl CompletionTracker {
    /// Records `tile` as complete.
    ///
    /// # Panics
    ///
    /// Panics if the tile was already complete: the dispatcher never hands
    /// out the same tile twice.
    fn complete(&mut self, tile: TileAddress) {
        assert!(
            self.completed.insert(tile),
            "tile {} reported complete twice",
            tile
        );
    }

    fn is_complete(&self, tile: &TileAddress) -> bool {
        self.completed.contains(tile)
    }

    fn len(&self) -> usize {
        self.completed.len()
    }

    /// Needed parents of completed tiles that were never scheduled.
    ///
    /// Non-empty only when the tree reports a needed tile with no needed
    /// leaf below it.
    fn waiting_parents(&self, tree: &dyn TileTree) -> Vec<TileAddress> {
        let mut waiting: Vec<TileAddress> = self
            .completed
            .iter()
            .filter_map(TileAddress::parent)
            .filter(|parent| !self.completed.contains(parent) && !self.scheduled.contains(parent))
            .collect();
        waiting.sort();
        waiting.dedup();
        if waiting.is_empty() {
            waiting.push(TileAddress::ROOT);
        }
        waiting
    }

    /// Returns composite work for the parent of `tile` if that parent just
    /// became ready.
    ///
    /// A parent is ready when each of its children is either not needed or
    /// complete. A parent is handed out at most once; later calls for the
    /// same parent return `None`.
    fn ready_parent(&mut self, tile: &TileAddress, tree: &dyn TileTree) -> Option<WorkItem> {
        let parent = tile.parent()?;
        if self.scheduled.contains(&parent) || self.completed.contains(&parent) {
            return None;
        }

        let children = parent.children();
        let ready = children
            .iter()
            .all(|child| !tree.is_needed(child) || self.completed.contains(child));
        if !ready {
            return None;
        }

        self.scheduled.insert(parent);
        let absent = children.into_iter().filter(|child| !tree.is_needed(child));
        Some(WorkItem::composite(parent, absent))
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Renders a tile pyramid on a pool of worker threads in dependency order.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with the given configuration.
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Renders every needed tile of `tree` and returns once the root exists.
    ///
    /// # Errors
    ///
    /// The run aborts on the first failed work item: queued work is dropped,
    /// in-flight work finishes, workers are joined and the failure is
    /// returned as [`DispatchError::Render`]. A panicking worker aborts the
    /// run the same way and surfaces as [`DispatchError::WorkerPanicked`].
    pub fn dispatch(
        &self,
        tree: Arc<dyn TileTree>,
        renderer: Arc<dyn TileRenderer>,
        progress: &dyn ProgressSink,
    ) -> DispatchResult<DispatchSummary> {
        let start = Instant::now();
        let channel = Arc::new(WorkChannel::new());

        // SEEDING
        let seed_depth = self.config.seed_depth(tree.max_depth());
        let seeds = tree.needed_at_depth(seed_depth);
        let render_tiles = tree.render_tile_count();
        progress.set_total(render_tiles);

        if seeds.is_empty() {
            warn!("No tiles to render, world is empty");
            progress.finish();
            return Ok(DispatchSummary {
                elapsed: start.elapsed(),
                ..Default::default()
            });
        }

        for tile in &seeds {
            channel.submit_work(WorkItem::render(*tile));
        }
        let mut in_flight = seeds.len();

        let threads = self.config.threads.max(1);
        info!(
            threads,
            render_tiles,
            jobs = seeds.len(),
            max_depth = tree.max_depth(),
            seed_depth,
            "Starting render"
        );

        let handles = match spawn_workers(threads, &channel, &tree, &renderer) {
            Ok(handles) => handles,
            Err(e) => {
                error!(error = %e, "Failed to start worker pool");
                progress.finish();
                return Err(DispatchError::Spawn(e));
            }
        };

        // DRAINING
        let mut tracker = CompletionTracker::default();
        let mut failure: Option<WorkFailure> = None;
        let mut rendered_tiles = 0u64;
        let mut composite_items = 0usize;
        let mut stalled = Vec::new();

        while let Some(result) = channel.take_result() {
            in_flight -= 1;
            let rendered = result.rendered_count();
            debug!(
                kind = ?result.kind(),
                produced = result.produce().len(),
                skipped = result.skip_children().len(),
                rendered,
                in_flight,
                "Result received"
            );
            let (produce, outcome) = result.into_outcome();

            if let Err(work_failure) = outcome {
                if failure.is_none() {
                    let dropped = channel.cancel();
                    error!(
                        tile = %work_failure.tile,
                        error = %work_failure.error,
                        dropped,
                        "Render failed, aborting"
                    );
                    failure = Some(work_failure);
                }
                continue;
            }
            if failure.is_some() {
                continue;
            }

            rendered_tiles += rendered;
            progress.add_progress(rendered);

            for tile in produce {
                tracker.complete(tile);

                if tile.is_root() {
                    debug!("Root tile complete");
                    channel.mark_finished();
                    continue;
                }

                if let Some(item) = tracker.ready_parent(&tile, tree.as_ref()) {
                    if channel.is_finished() {
                        continue;
                    }
                    debug!(work = %item, "Parent ready");
                    composite_items += 1;
                    in_flight += 1;
                    channel.submit_priority_work(item);
                }
            }

            if in_flight == 0 && !tracker.is_complete(&TileAddress::ROOT) {
                stalled = tracker.waiting_parents(tree.as_ref());
                error!(waiting = ?stalled, "No work in flight but the root is incomplete");
                channel.cancel();
            }
        }

        // DONE
        let mut panicked = None;
        let mut executed = 0;
        let mut failed = 0;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(stats) => {
                    executed += stats.items;
                    failed += stats.failures;
                }
                Err(_) => {
                    error!(worker = id, "Worker thread panicked");
                    panicked.get_or_insert(id);
                }
            }
        }
        progress.finish();

        if let Some(worker) = panicked {
            return Err(DispatchError::WorkerPanicked { worker });
        }
        if let Some(WorkFailure { tile, error }) = failure {
            return Err(DispatchError::Render {
                tile,
                source: error,
            });
        }
        assert!(
            stalled.is_empty(),
            "dispatch stalled: needed tiles {:?} can never become ready",
            stalled
        );
        debug_assert!(tracker.is_complete(&TileAddress::ROOT));

        let summary = DispatchSummary {
            rendered_tiles,
            render_items: seeds.len(),
            composite_items,
            completed_tiles: tracker.len(),
            elapsed: start.elapsed(),
        };
        info!(
            rendered_tiles,
            work_items = executed,
            failed_items = failed,
            composite_items,
            duration_ms = summary.elapsed.as_millis(),
            "Render complete"
        );
        Ok(summary)
    }
}

/// Starts `count` named worker threads.
///
/// If a spawn fails, the channel is cancelled and already started workers
/// are joined before the error is returned.
fn spawn_workers(
    count: usize,
    channel: &Arc<WorkChannel>,
    tree: &Arc<dyn TileTree>,
    renderer: &Arc<dyn TileRenderer>,
) -> std::io::Result<Vec<JoinHandle<WorkerStats>>> {
    let mut handles = Vec::with_capacity(count);
    for id in 0..count {
        let worker = Worker::new(
            id,
            Arc::clone(channel),
            Arc::clone(tree),
            Arc::clone(renderer),
        );
        let spawned = thread::Builder::new()
            .name(format!("tile-worker-{}", id))
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                channel.cancel();
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(e);
            }
        }
    }
    Ok(handles)
}

// =============================================================================
// Tests
// =============================================================================
