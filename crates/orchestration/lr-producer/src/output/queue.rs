//! Queue output: the sending half of the task queue.

use async_trait::async_trait;
use lr_error::Result;
use lr_traits::MessageQueue;
use lr_types::{MAX_MESSAGE_BASENAMES, RollupTask};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use super::Output;

/// Sends each task as one JSON message.
///
/// A task with more than [`MAX_MESSAGE_BASENAMES`] basenames would not fit
/// in a single message and is split into chunks of that size first. Task
/// building already caps task size, so splitting here only guards the
/// transport limit.
pub struct QueueOutput<Q: MessageQueue> {
    queue: Q,
    max_basenames: usize,
    sent: AtomicUsize,
}

impl<Q: MessageQueue> QueueOutput<Q> {
    /// Create a queue output sending through `queue`.
    pub fn new(queue: Q) -> Self {
        Self {
            queue,
            max_basenames: MAX_MESSAGE_BASENAMES,
            sent: AtomicUsize::new(0),
        }
    }

    /// Number of messages sent so far.
    pub fn messages_sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    async fn send(&self, task: &RollupTask) -> Result<()> {
        let body = task.to_message()?;
        info!(task = %task, "Queuing task");
        self.queue.send(&body).await?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl<Q: MessageQueue> Output for QueueOutput<Q> {
    async fn output(&self, task: &RollupTask) -> Result<()> {
        if task.len() <= self.max_basenames {
            return self.send(task).await;
        }

        debug!(
            task = %task,
            max_basenames = self.max_basenames,
            "Splitting oversized task"
        );
        for chunk in task.split(self.max_basenames) {
            self.send(&chunk).await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lr_traits::memory::MemoryQueue;
    use std::sync::Arc;

    fn create_test_task(count: usize) -> RollupTask {
        let basenames = (0..count)
            .map(|i| format!("2022-06-30-00-00-00-{i:016X}"))
            .collect();
        RollupTask::new("role", "bucket1", "example.com/", basenames)
    }

    #[tokio::test]
    async fn test_output_sends_one_message() {
        let queue = Arc::new(MemoryQueue::new());
        let output = QueueOutput::new(queue.clone());
        let task = create_test_task(8);

        output.output(&task).await.unwrap();
        output.flush().await.unwrap();

        let bodies = queue.visible_bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(RollupTask::from_message(&bodies[0]).unwrap(), task);
        assert_eq!(output.messages_sent(), 1);
    }

    #[tokio::test]
    async fn test_output_splits_oversized_task() {
        let queue = Arc::new(MemoryQueue::new());
        let output = QueueOutput::new(queue.clone());
        let task = create_test_task(MAX_MESSAGE_BASENAMES * 2 + 1);

        output.output(&task).await.unwrap();

        let decoded: Vec<RollupTask> = queue
            .visible_bodies()
            .iter()
            .map(|body| RollupTask::from_message(body).unwrap())
            .collect();
        let lengths: Vec<usize> = decoded.iter().map(|t| t.len()).collect();
        assert_eq!(lengths, vec![MAX_MESSAGE_BASENAMES, MAX_MESSAGE_BASENAMES, 1]);

        let rejoined: Vec<String> = decoded.into_iter().flat_map(|t| t.basenames).collect();
        assert_eq!(rejoined, task.basenames);
    }

    #[tokio::test]
    async fn test_output_at_limit_is_not_split() {
        let queue = Arc::new(MemoryQueue::new());
        let output = QueueOutput::new(queue.clone());

        output.output(&create_test_task(MAX_MESSAGE_BASENAMES)).await.unwrap();

        assert_eq!(queue.sent_count(), 1);
    }
}
