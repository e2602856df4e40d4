//! Message queue trait.

use async_trait::async_trait;
use lr_error::Result;
use std::sync::Arc;

/// Trait for message queue backends.
///
/// # Message Flow
///
/// 1. The producer calls [`send`](MessageQueue::send) once per task
/// 2. Workers call [`receive`](MessageQueue::receive) to get messages, which
///    become invisible to other consumers for the visibility timeout
/// 3. After a task succeeds, the worker calls [`delete`](MessageQueue::delete);
///    a message that is never deleted is redelivered once its timeout expires
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Sends one message.
    async fn send(&self, body: &str) -> Result<()>;

    /// Receives up to `max` messages; may return fewer, or none.
    async fn receive(&self, max: usize) -> Result<Vec<RawMessage>>;

    /// Deletes (acknowledges) a received message.
    async fn delete(&self, receipt_handle: &str) -> Result<()>;
}

#[async_trait]
impl<T: MessageQueue + ?Sized> MessageQueue for Arc<T> {
    async fn send(&self, body: &str) -> Result<()> {
        (**self).send(body).await
    }

    async fn receive(&self, max: usize) -> Result<Vec<RawMessage>> {
        (**self).receive(max).await
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        (**self).delete(receipt_handle).await
    }
}

/// A message as delivered by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Message body
    pub body: String,

    /// Handle used to delete this delivery
    pub receipt_handle: String,
}
