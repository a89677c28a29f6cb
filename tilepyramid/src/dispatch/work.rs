//! Work units exchanged between the dispatcher and its workers.

use std::collections::BTreeSet;
use std::fmt;

use crate::render::RenderError;
use crate::tile::{TileAddress, TileTree};

/// What a worker must do with the tiles of a [`WorkItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkKind {
    /// Render tiles from world data.
    ///
    /// A leaf-depth tile is rendered directly; a shallower tile has its whole
    /// needed subtree rendered and composited inside the same worker.
    Render,

    /// Composite a parent from children that are already rendered.
    Composite,
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkKind::Render => f.write_str("render"),
            WorkKind::Composite => f.write_str("composite"),
        }
    }
}

/// A unit of schedulable work.
///
/// Built by the dispatcher, executed exactly once by one worker. Never
/// modified after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    kind: WorkKind,
    produce: BTreeSet<TileAddress>,
    skip_children: BTreeSet<TileAddress>,
}

impl WorkItem {
    /// Work that renders `tile` (and its subtree when above leaf depth).
    pub fn render(tile: TileAddress) -> Self {
        Self {
            kind: WorkKind::Render,
            produce: BTreeSet::from([tile]),
            skip_children: BTreeSet::new(),
        }
    }

    /// Work that composites `tile` from its children, leaving out `skip_children`.
    pub fn composite<I>(tile: TileAddress, skip_children: I) -> Self
    where
        I: IntoIterator<Item = TileAddress>,
    {
        Self {
            kind: WorkKind::Composite,
            produce: BTreeSet::from([tile]),
            skip_children: skip_children.into_iter().collect(),
        }
    }

    /// Work kind.
    pub fn kind(&self) -> WorkKind {
        self.kind
    }

    /// Tiles this unit must produce.
    pub fn produce(&self) -> &BTreeSet<TileAddress> {
        &self.produce
    }

    /// Children the executor must not read or derive.
    pub fn skip_children(&self) -> &BTreeSet<TileAddress> {
        &self.skip_children
    }

    /// Leaf-tile equivalents newly realized by executing this unit.
    ///
    /// Render work realizes every needed leaf below its tiles except those
    /// under skipped children. Composite work realizes none: its needed
    /// children were already counted when they were rendered.
    pub fn rendered_count(&self, tree: &dyn TileTree) -> u64 {
        match self.kind {
            WorkKind::Composite => 0,
            WorkKind::Render => {
                let produced: u64 = self
                    .produce
                    .iter()
                    .map(|tile| tree.render_tiles_under(tile))
                    .sum();
                let skipped: u64 = self
                    .skip_children
                    .iter()
                    .map(|tile| tree.render_tiles_under(tile))
                    .sum();
                produced.saturating_sub(skipped)
            }
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.kind)?;
        for (i, tile) in self.produce.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", tile)?;
        }
        f.write_str("]")
    }
}

/// Failure reported by a worker for one tile of a work item.
#[derive(Debug)]
pub struct WorkFailure {
    /// Tile whose rendering failed.
    pub tile: TileAddress,
    /// Error from the renderer.
    pub error: RenderError,
}

/// Outcome of executing one [`WorkItem`].
#[derive(Debug)]
pub struct WorkResult {
    kind: WorkKind,
    produce: BTreeSet<TileAddress>,
    skip_children: BTreeSet<TileAddress>,
    rendered_count: u64,
    outcome: Result<(), WorkFailure>,
}

impl WorkResult {
    /// Result for a work item that ran to completion.
    pub fn completed(item: WorkItem, rendered_count: u64) -> Self {
        Self {
            kind: item.kind,
            produce: item.produce,
            skip_children: item.skip_children,
            rendered_count,
            outcome: Ok(()),
        }
    }

    /// Result for a work item whose execution failed at `tile`.
    pub fn failed(item: WorkItem, tile: TileAddress, error: RenderError) -> Self {
        Self {
            kind: item.kind,
            produce: item.produce,
            skip_children: item.skip_children,
            rendered_count: 0,
            outcome: Err(WorkFailure { tile, error }),
        }
    }

    /// Kind of the executed work.
    pub fn kind(&self) -> WorkKind {
        self.kind
    }

    /// Tiles the work item produced.
    pub fn produce(&self) -> &BTreeSet<TileAddress> {
        &self.produce
    }

    /// Children skipped during execution.
    pub fn skip_children(&self) -> &BTreeSet<TileAddress> {
        &self.skip_children
    }

    /// Leaf-tile equivalents realized (progress only).
    pub fn rendered_count(&self) -> u64 {
        self.rendered_count
    }

    /// Returns true when the work completed.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Splits the result into its produced tiles and its outcome.
    pub fn into_outcome(self) -> (BTreeSet<TileAddress>, Result<(), WorkFailure>) {
        (self.produce, self.outcome)
    }
}
