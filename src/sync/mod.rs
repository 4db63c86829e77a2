//! Channel synchronization.
//!
//! [`FetchPipeline`] moves articles from the content source into storage,
//! [`Scheduler`] decides when full syncs run, and [`BackgroundTasks`] tracks
//! the syncs launched without waiting on them.

pub mod pipeline;
pub mod scheduler;
pub mod tasks;

pub use pipeline::{FetchPipeline, SyncReport, SyncSummary};
pub use scheduler::{
    parse_trigger_times, Scheduler, SchedulerStatus, TriggerTime, DEFAULT_TRIGGER_TIMES,
};
pub use tasks::BackgroundTasks;
