//! Output implementations for rollup tasks.
//!
//! This module provides the [`Output`] trait and implementations for
//! delivering tasks produced by the scheduler:
//! - [`QueueOutput`] - Sends tasks to a message queue
//! - [`StdoutOutput`] - Prints tasks to stdout in JSON or JSONL format

mod queue;
mod stdout;

pub use queue::QueueOutput;
pub use stdout::{OutputFormat, StdoutOutput};

use async_trait::async_trait;
use lr_error::Result;
use lr_types::RollupTask;

/// Trait for outputting rollup tasks.
///
/// Implementations handle the delivery of tasks to their final destination,
/// whether that's a queue read by workers or stdout for a dry run.
#[async_trait]
pub trait Output: Send + Sync {
    /// Output a single task.
    async fn output(&self, task: &RollupTask) -> Result<()>;

    /// Flush any buffered output.
    ///
    /// Called after all tasks have been output to ensure all data is written.
    async fn flush(&self) -> Result<()>;
}
