//! Progress reporting for render runs.
//!
//! The dispatcher reports progress in leaf-tile equivalents: it announces the
//! total once, then adds the count carried by each finished work item.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Default percentage step between log lines for [`LogProgress`].
pub const DEFAULT_LOG_STEP_PERCENT: u64 = 10;

/// Receives progress updates from the dispatcher.
///
/// Calls arrive from the dispatcher's own thread only, but sinks are shared
/// with other threads (UI, reporters), hence `Send + Sync`.
pub trait ProgressSink: Send + Sync {
    /// Announces the total number of leaf tiles the run will produce.
    fn set_total(&self, total: u64);

    /// Adds newly rendered leaf tiles.
    fn add_progress(&self, tiles: u64);

    /// Called once after the run ends, successfully or not.
    fn finish(&self) {}
}

/// Sink that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn set_total(&self, _total: u64) {}

    fn add_progress(&self, _tiles: u64) {}
}

/// Sink that keeps running totals in atomic counters.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    total: AtomicU64,
    value: AtomicU64,
}

impl ProgressCounter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Announced total.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Tiles reported so far.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Fraction complete in `0.0..=1.0` (1.0 when the total is zero).
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        (self.value() as f64 / total as f64).min(1.0)
    }
}

impl ProgressSink for ProgressCounter {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn add_progress(&self, tiles: u64) {
        self.value.fetch_add(tiles, Ordering::SeqCst);
    }
}

/// Sink that writes a log line every time another percentage step is crossed.
#[derive(Debug)]
pub struct LogProgress {
    counter: ProgressCounter,
    step_percent: u64,
    /// Highest step already logged.
    last_step: AtomicU64,
}

impl LogProgress {
    /// Creates a logging sink with the given step (clamped to 1..=100).
    pub fn new(step_percent: u64) -> Self {
        Self {
            counter: ProgressCounter::new(),
            step_percent: step_percent.clamp(1, 100),
            last_step: AtomicU64::new(0),
        }
    }

    /// Underlying counters.
    pub fn counter(&self) -> &ProgressCounter {
        &self.counter
    }

    fn percent(&self) -> u64 {
        (self.counter.fraction() * 100.0).floor() as u64
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_STEP_PERCENT)
    }
}

impl ProgressSink for LogProgress {
    fn set_total(&self, total: u64) {
        self.counter.set_total(total);
        self.last_step.store(0, Ordering::SeqCst);
        info!(total_tiles = total, "Render started");
    }

    fn add_progress(&self, tiles: u64) {
        self.counter.add_progress(tiles);

        let step = self.percent() / self.step_percent;
        if step > self.last_step.fetch_max(step, Ordering::SeqCst) {
            info!(
                rendered = self.counter.value(),
                total = self.counter.total(),
                percent = self.percent(),
                "Render progress"
            );
        }
    }

    fn finish(&self) {
        info!(
            rendered = self.counter.value(),
            total = self.counter.total(),
            "Render finished"
        );
    }
}
