//! Shared work and result queues.
//!
//! [`WorkChannel`] is the only state shared between the dispatcher and its
//! workers:
//!
//! ```text
//!                ┌──────────────── WorkChannel ────────────────┐
//!  Dispatcher ──►│ normal lane (render work, FIFO)             │
//!             ──►│ extra lane  (composite work, FIFO, served   │──► Workers
//!                │              before the normal lane)        │
//!  Dispatcher ◄──│ result lane (FIFO)                          │◄── Workers
//!                └─────────────────────────────────────────────┘
//! ```
//!
//! Composite work always wins over render work that has not started yet.
//! Finishing a parent before starting another subtree keeps the number of
//! half-built subtrees, and the memory they hold, small.
//!
//! Closing the channel with [`WorkChannel::mark_finished`] wakes every
//! blocked thread. Workers keep draining queued work and then see `None`.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::work::{WorkItem, WorkResult};

/// Snapshot of queue depths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Items waiting in the normal lane.
    pub normal: usize,
    /// Items waiting in the extra (priority) lane.
    pub extra: usize,
    /// Results waiting for the dispatcher.
    pub results: usize,
    /// Whether the channel has been closed.
    pub finished: bool,
}

#[derive(Debug, Default)]
struct ChannelState {
    normal: VecDeque<WorkItem>,
    extra: VecDeque<WorkItem>,
    results: VecDeque<WorkResult>,
    finished: bool,
}

/// Thread-safe dual-priority work queue plus result queue.
#[derive(Debug, Default)]
pub struct WorkChannel {
    state: Mutex<ChannelState>,
    /// Signalled when work arrives or the channel closes.
    work_ready: Condvar,
    /// Signalled when a result arrives or the channel closes.
    result_ready: Condvar,
}

impl WorkChannel {
    /// Creates an empty, open channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends work to the normal lane.
    pub fn submit_work(&self, item: WorkItem) {
        self.state.lock().normal.push_back(item);
        self.work_ready.notify_one();
    }

    /// Appends work to the extra lane, which is served first.
    pub fn submit_priority_work(&self, item: WorkItem) {
        self.state.lock().extra.push_back(item);
        self.work_ready.notify_one();
    }

    /// Blocks until work is available and returns it.
    ///
    /// Returns `None` once the channel is finished and both lanes are empty.
    pub fn take_work(&self) -> Option<WorkItem> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.extra.pop_front() {
                return Some(item);
            }
            if let Some(item) = state.normal.pop_front() {
                return Some(item);
            }
            if state.finished {
                return None;
            }
            self.work_ready.wait(&mut state);
        }
    }

    /// Hands a result back to the dispatcher.
    pub fn report_result(&self, result: WorkResult) {
        self.state.lock().results.push_back(result);
        self.result_ready.notify_one();
    }

    /// Blocks until a result is available and returns it.
    ///
    /// Returns `None` once the channel is finished and the result lane is empty.
    pub fn take_result(&self) -> Option<WorkResult> {
        let mut state = self.state.lock();
        loop {
            if let Some(result) = state.results.pop_front() {
                return Some(result);
            }
            if state.finished {
                return None;
            }
            self.result_ready.wait(&mut state);
        }
    }

    /// Closes the channel and wakes every blocked thread. Idempotent.
    pub fn mark_finished(&self) {
        self.state.lock().finished = true;
        self.work_ready.notify_all();
        self.result_ready.notify_all();
    }

    /// Discards all queued work, then closes the channel.
    ///
    /// Returns the number of work items dropped. Results already reported
    /// stay available to [`WorkChannel::take_result`].
    pub fn cancel(&self) -> usize {
        let dropped = {
            let mut state = self.state.lock();
            let dropped = state.normal.len() + state.extra.len();
            state.normal.clear();
            state.extra.clear();
            state.finished = true;
            dropped
        };
        self.work_ready.notify_all();
        self.result_ready.notify_all();
        dropped
    }

    /// Returns true once the channel has been closed.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Current queue depths.
    pub fn stats(&self) -> ChannelStats {
        let state = self.state.lock();
        ChannelStats {
            normal: state.normal.len(),
            extra: state.extra.len(),
            results: state.results.len(),
            finished: state.finished,
        }
    }
}
