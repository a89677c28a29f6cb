//! Worker loop executed on each dispatcher thread.
//!
//! A worker only executes what it is handed. It never looks at which tiles
//! are complete and never submits work; all tree-dependency decisions stay
//! on the dispatcher thread.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use super::channel::WorkChannel;
use super::work::{WorkItem, WorkKind, WorkResult};
use crate::render::{RenderError, TileRenderer};
use crate::tile::{TileAddress, TileTree};

/// Counters returned by a worker when its loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Work items executed, failed ones included.
    pub items: usize,
    /// Work items that failed.
    pub failures: usize,
}

/// Executes work items pulled from a [`WorkChannel`].
pub struct Worker {
    id: usize,
    channel: Arc<WorkChannel>,
    tree: Arc<dyn TileTree>,
    renderer: Arc<dyn TileRenderer>,
}

impl Worker {
    /// Creates worker `id` bound to the given channel, tree and renderer.
    pub fn new(
        id: usize,
        channel: Arc<WorkChannel>,
        tree: Arc<dyn TileTree>,
        renderer: Arc<dyn TileRenderer>,
    ) -> Self {
        Self {
            id,
            channel,
            tree,
            renderer,
        }
    }

    /// Runs until the channel is closed and drained.
    pub fn run(self) -> WorkerStats {
        // Unwinding closes the channel so the dispatcher stops waiting.
        let _guard = CancelOnPanic(&self.channel);

        let mut stats = WorkerStats::default();
        while let Some(item) = self.channel.take_work() {
            let result = self.execute(item);
            stats.items += 1;
            if !result.is_success() {
                stats.failures += 1;
            }
            self.channel.report_result(result);
        }

        debug!(worker = self.id, items = stats.items, "Worker exiting");
        stats
    }

    /// Executes one work item and builds its result.
    pub fn execute(&self, item: WorkItem) -> WorkResult {
        let start = Instant::now();
        let outcome = match item.kind() {
            WorkKind::Render => item
                .produce()
                .iter()
                .try_for_each(|tile| self.render_subtree(tile, item.skip_children())),
            WorkKind::Composite => item.produce().iter().try_for_each(|tile| {
                self.renderer
                    .composite_parent(tile, item.skip_children())
                    .map_err(|e| (*tile, e))
            }),
        };

        match outcome {
            Ok(()) => {
                let rendered = item.rendered_count(self.tree.as_ref());
                debug!(
                    worker = self.id,
                    work = %item,
                    rendered,
                    duration_ms = start.elapsed().as_millis(),
                    "Work completed"
                );
                WorkResult::completed(item, rendered)
            }
            Err((tile, error)) => {
                warn!(
                    worker = self.id,
                    work = %item,
                    tile = %tile,
                    error = %error,
                    "Work failed"
                );
                WorkResult::failed(item, tile, error)
            }
        }
    }

    /// Renders `tile`, recursing through its needed subtree when it lies above
    /// the leaf level. Tiles in `skip` already exist and are left alone.
    fn render_subtree(
        &self,
        tile: &TileAddress,
        skip: &BTreeSet<TileAddress>,
    ) -> Result<(), (TileAddress, RenderError)> {
        if skip.contains(tile) {
            return Ok(());
        }
        if tile.depth() >= self.tree.max_depth() {
            return self.renderer.render_leaf(tile).map_err(|e| (*tile, e));
        }

        let mut absent = BTreeSet::new();
        for child in tile.children() {
            if self.tree.is_needed(&child) {
                self.render_subtree(&child, skip)?;
            } else {
                absent.insert(child);
            }
        }

        self.renderer
            .composite_parent(tile, &absent)
            .map_err(|e| (*tile, e))
    }
}

/// Cancels the channel if the owning thread unwinds.
struct CancelOnPanic<'a>(&'a WorkChannel);

impl Drop for CancelOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::SparseTileTree;
    use parking_lot::Mutex;

    fn addr(s: &str) -> TileAddress {
        s.parse().unwrap()
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Leaf(TileAddress),
        Composite(TileAddress, Vec<TileAddress>),
    }

    /// Renderer that records every call and can fail on one tile.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<Call>>,
        fail_on: Option<TileAddress>,
        panic_on: Option<TileAddress>,
    }

    impl RecordingRenderer {
        fn check(&self, tile: &TileAddress) -> Result<(), RenderError> {
            if self.panic_on == Some(*tile) {
                panic!("renderer exploded on {}", tile);
            }
            if self.fail_on == Some(*tile) {
                return Err(RenderError::Failed(format!("cannot render {}", tile)));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }
    }

    impl TileRenderer for RecordingRenderer {
        fn render_leaf(&self, tile: &TileAddress) -> Result<(), RenderError> {
            self.check(tile)?;
            self.calls.lock().push(Call::Leaf(*tile));
            Ok(())
        }

        fn composite_parent(
            &self,
            tile: &TileAddress,
            skip_children: &BTreeSet<TileAddress>,
        ) -> Result<(), RenderError> {
            self.check(tile)?;
            self.calls
                .lock()
                .push(Call::Composite(*tile, skip_children.iter().copied().collect()));
            Ok(())
        }
    }

    fn tree() -> Arc<dyn TileTree> {
        Arc::new(SparseTileTree::new(2, [addr("1-1"), addr("1-2"), addr("2-1")]).unwrap())
    }

    fn worker(renderer: Arc<RecordingRenderer>) -> (Worker, Arc<WorkChannel>) {
        let channel = Arc::new(WorkChannel::new());
        let worker = Worker::new(0, Arc::clone(&channel), tree(), renderer);
        (worker, channel)
    }

    #[test]
    fn test_execute_leaf() {
        let renderer = Arc::new(RecordingRenderer::default());
        let (worker, _) = worker(Arc::clone(&renderer));

        let result = worker.execute(WorkItem::render(addr("1-2")));
        assert!(result.is_success());
        assert_eq!(result.rendered_count(), 1);
        assert_eq!(renderer.calls(), vec![Call::Leaf(addr("1-2"))]);
    }

    #[test]
    fn test_execute_composite_passes_skip_set() {
        let renderer = Arc::new(RecordingRenderer::default());
        let (worker, _) = worker(Arc::clone(&renderer));

        let item = WorkItem::composite(addr("1"), [addr("1-3"), addr("1-4")]);
        let result = worker.execute(item);
        assert!(result.is_success());
        assert_eq!(result.rendered_count(), 0);
        assert_eq!(
            renderer.calls(),
            vec![Call::Composite(addr("1"), vec![addr("1-3"), addr("1-4")])]
        );
    }

    #[test]
    fn test_execute_subtree_render_is_bottom_up() {
        let renderer = Arc::new(RecordingRenderer::default());
        let (worker, _) = worker(Arc::clone(&renderer));

        let result = worker.execute(WorkItem::render(addr("1")));
        assert!(result.is_success());
        assert_eq!(result.rendered_count(), 2);
        assert_eq!(
            renderer.calls(),
            vec![
                Call::Leaf(addr("1-1")),
                Call::Leaf(addr("1-2")),
                Call::Composite(addr("1"), vec![addr("1-3"), addr("1-4")]),
            ]
        );
    }

    #[test]
    fn test_execute_reports_failure() {
        let renderer = Arc::new(RecordingRenderer {
            fail_on: Some(addr("1-2")),
            ..Default::default()
        });
        let (worker, _) = worker(Arc::clone(&renderer));

        let result = worker.execute(WorkItem::render(addr("1")));
        assert!(!result.is_success());
        let (_, outcome) = result.into_outcome();
        assert_eq!(outcome.unwrap_err().tile, addr("1-2"));
        // Parent composite is never attempted after a child failed
        assert_eq!(renderer.calls(), vec![Call::Leaf(addr("1-1"))]);
    }

    #[test]
    fn test_run_drains_until_closed() {
        let renderer = Arc::new(RecordingRenderer::default());
        let (worker, channel) = worker(Arc::clone(&renderer));

        channel.submit_work(WorkItem::render(addr("1-1")));
        channel.submit_work(WorkItem::render(addr("2-1")));
        channel.mark_finished();

        let stats = worker.run();
        assert_eq!(stats, WorkerStats { items: 2, failures: 0 });
        assert!(channel.take_result().is_some());
        assert!(channel.take_result().is_some());
        assert!(channel.take_result().is_none());
    }

    #[test]
    fn test_run_counts_failed_items() {
        let renderer = Arc::new(RecordingRenderer {
            fail_on: Some(addr("2-1")),
            ..Default::default()
        });
        let (worker, channel) = worker(renderer);

        channel.submit_work(WorkItem::render(addr("1-1")));
        channel.submit_work(WorkItem::render(addr("2-1")));
        channel.mark_finished();

        assert_eq!(worker.run(), WorkerStats { items: 2, failures: 1 });
        let first = channel.take_result().unwrap();
        let second = channel.take_result().unwrap();
        assert!(first.is_success());
        assert!(!second.is_success());
        assert_eq!(second.kind(), WorkKind::Render);
        assert!(second.skip_children().is_empty());
    }

    #[test]
    fn test_panicking_renderer_cancels_channel() {
        let renderer = Arc::new(RecordingRenderer {
            panic_on: Some(addr("1-1")),
            ..Default::default()
        });
        let (worker, channel) = worker(renderer);
        channel.submit_work(WorkItem::render(addr("1-1")));
        channel.submit_work(WorkItem::render(addr("1-2")));

        let handle = thread::spawn(move || worker.run());
        assert!(handle.join().is_err());
        assert!(channel.is_finished());
        assert_eq!(channel.stats().normal, 0);
    }
}
