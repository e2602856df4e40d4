//! Task sources.
//!
//! [`TaskQueue`] is the dequeue side of the rollup queue: it receives raw
//! messages, decodes them into [`RollupTask`]s and acknowledges them once the
//! caller has archived the task.

mod queue;

pub use queue::{MAX_RECEIVE_BATCH, TaskQueue};

use lr_types::RollupTask;

/// A decoded task together with the handle of the delivery it came in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMessage {
    /// The task payload
    pub task: RollupTask,

    /// Handle used to acknowledge this delivery
    pub receipt_handle: String,
}
