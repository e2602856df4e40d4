//! lr-worker - Rollup task consumer for logroll.
//!
//! A worker receives rollup tasks from the queue, downloads each task's log
//! objects, packs them into one gzip-compressed tarball next to the sources,
//! and optionally deletes the sources once the archive is uploaded.
//!
//! Delivery is at least once: a message is acknowledged only after its task
//! succeeded, so a failed task comes back after the visibility timeout.
//!
//! # Example
//!
//! ```ignore
//! use lr_worker::{Worker, WorkerConfig};
//!
//! let config = WorkerConfig::new()
//!     .with_message_count(100)
//!     .with_delete_sources(true);
//!
//! let worker = Worker::new(config, queue, sessions);
//! let stats = worker.run().await?;
//!
//! eprintln!("Archived {} tasks", stats.tasks_succeeded);
//! ```

pub mod config;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod worker;

pub use config::WorkerConfig;
pub use pipeline::{ArchiveOutcome, ArchivePipeline, METADATA_FILE_COUNT, METADATA_FILE_SIZE};
pub use source::{MAX_RECEIVE_BATCH, TaskMessage, TaskQueue};
pub use stats::{StatsSnapshot, WorkerStats};
pub use worker::Worker;
