//! Queue-backed task source.

use lr_error::Result;
use lr_traits::{MessageQueue, RawMessage};
use lr_types::RollupTask;
use tracing::{debug, error, warn};

use super::TaskMessage;

/// Most messages SQS hands out per receive call.
pub const MAX_RECEIVE_BATCH: usize = 10;

/// Receives rollup tasks from a message queue.
///
/// A message is only deleted through [`ack`](TaskQueue::ack), so a task whose
/// processing fails stays on the queue and is redelivered after the
/// visibility timeout. Malformed messages are the exception: they are deleted
/// as soon as they are decoded.
pub struct TaskQueue<Q> {
    queue: Q,
}

impl<Q: MessageQueue> TaskQueue<Q> {
    /// Create a task source over `queue`.
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    /// The underlying queue.
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Receive up to `max` raw messages, never more than [`MAX_RECEIVE_BATCH`].
    pub async fn receive(&self, max: usize) -> Result<Vec<RawMessage>> {
        let batch_size = max.clamp(1, MAX_RECEIVE_BATCH);
        let messages = self.queue.receive(batch_size).await?;
        debug!("Received {} messages", messages.len());
        Ok(messages)
    }

    /// Decode a raw message into a task.
    ///
    /// Returns `None` for a body that is not a valid, non-empty task. Such a
    /// message is deleted so it cannot be redelivered forever.
    pub async fn decode(&self, message: RawMessage) -> Option<TaskMessage> {
        match RollupTask::from_message(&message.body) {
            Ok(task) => Some(TaskMessage {
                task,
                receipt_handle: message.receipt_handle,
            }),
            Err(e) => {
                error!(error = %e, "Failed to parse rollup task from message");
                if let Err(del_err) = self.queue.delete(&message.receipt_handle).await {
                    warn!(error = %del_err, "Failed to delete malformed message");
                }
                None
            }
        }
    }

    /// Acknowledge a processed task, removing its message from the queue.
    pub async fn ack(&self, message: &TaskMessage) -> Result<()> {
        self.queue.delete(&message.receipt_handle).await?;
        debug!(task = %message.task, "Acknowledged message");
        Ok(())
    }
}
