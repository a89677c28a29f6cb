//! Concurrent, dependency-ordered tile dispatch.
//!
//! Leaf tiles are rendered first; a parent is composited as soon as all of
//! its needed children exist. The pieces:
//!
//! - [`WorkItem`] / [`WorkResult`]: units of work and their outcomes
//! - [`WorkChannel`]: dual-priority work queue plus result queue
//! - [`Worker`]: per-thread execution loop
//! - [`Dispatcher`]: seeds work, tracks completion, schedules parents

mod channel;
mod error;
mod scheduler;
mod work;
mod worker;

pub use channel::{ChannelStats, WorkChannel};
pub use error::{DispatchError, DispatchResult};
pub use scheduler::{
    default_thread_count, DispatchConfig, DispatchSummary, Dispatcher, DEFAULT_BATCH_DEPTH,
};
pub use work::{WorkFailure, WorkItem, WorkKind, WorkResult};
pub use worker::{Worker, WorkerStats};
