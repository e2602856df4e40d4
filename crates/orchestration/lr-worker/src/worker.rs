//! Main Worker implementation.

use lr_error::{Result, classify_error};
use lr_traits::{MessageQueue, RawMessage, SessionProvider};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::pipeline::ArchivePipeline;
use crate::source::{MAX_RECEIVE_BATCH, TaskMessage, TaskQueue};
use crate::stats::{StatsSnapshot, WorkerStats};

/// Pulls rollup tasks off a queue and archives them.
///
/// Concurrency is horizontal: a worker handles one task at a time, and
/// throughput comes from running more workers against the same queue.
pub struct Worker<Q> {
    config: WorkerConfig,
    source: TaskQueue<Q>,
    pipeline: ArchivePipeline,
    stats: Arc<WorkerStats>,
}

impl<Q: MessageQueue> Worker<Q> {
    /// Create a new worker.
    pub fn new(config: WorkerConfig, queue: Q, sessions: Arc<dyn SessionProvider>) -> Self {
        let pipeline = ArchivePipeline::new(sessions, &config);
        Self {
            config,
            source: TaskQueue::new(queue),
            pipeline,
            stats: Arc::new(WorkerStats::new()),
        }
    }

    /// Statistics of this worker, shared with callers that report progress.
    pub fn stats(&self) -> Arc<WorkerStats> {
        self.stats.clone()
    }

    /// Handle up to `message_count` messages.
    ///
    /// Stops early once a receive returns nothing. Failed tasks are counted
    /// and left on the queue; only queue transport errors end the run with an
    /// error.
    pub async fn run(&self) -> Result<StatsSnapshot> {
        info!(
            messages = self.config.message_count,
            delete_sources = self.config.delete_sources,
            "Worker starting"
        );

        let mut handled = 0;
        while handled < self.config.message_count {
            let received = self.dequeue(self.config.message_count - handled).await?;
            if received == 0 {
                info!("No messages in queue");
                break;
            }
            handled += received;
        }

        self.stats.complete();
        let snapshot = self.stats.snapshot();
        info!(
            succeeded = snapshot.tasks_succeeded,
            failed = snapshot.tasks_failed,
            malformed = snapshot.malformed_messages,
            "Worker finished"
        );
        Ok(snapshot)
    }

    /// Receive one batch of at most `max` messages and handle each in turn.
    ///
    /// Returns the number of messages received.
    pub async fn dequeue(&self, max: usize) -> Result<usize> {
        let messages = self.source.receive(max.min(MAX_RECEIVE_BATCH)).await?;
        let received = messages.len();

        for message in messages {
            self.handle_record(message).await;
        }
        Ok(received)
    }

    /// Handle one delivered message: decode, archive, then acknowledge.
    ///
    /// Returns true if the task was archived.
    pub async fn handle_record(&self, message: RawMessage) -> bool {
        match self.source.decode(message).await {
            Some(message) => self.handle(message).await,
            None => {
                self.stats.record_malformed();
                false
            }
        }
    }

    async fn handle(&self, message: TaskMessage) -> bool {
        let task = &message.task;
        info!(task = %task, "Processing task");

        match self.pipeline.process(task, self.config.delete_sources).await {
            Ok(outcome) => {
                info!(task = %task, key = %outcome.tarball_key, "Task archived");
                self.stats.record_success(&outcome);
                if let Err(e) = self.source.ack(&message).await {
                    warn!(task = %task, error = %e, "Failed to acknowledge message");
                }
                true
            }
            Err(e) => {
                let category = classify_error(&e);
                error!(
                    task = %task,
                    error = %e,
                    category = %category,
                    "Task failed, leaving message for redelivery"
                );
                self.stats.record_failure(category);
                false
            }
        }
    }
}
