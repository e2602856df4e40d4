//! SQS-backed message queue.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use lr_error::{QueueError, Result};
use lr_traits::{MessageQueue, RawMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for the SQS queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqsQueueConfig {
    /// Queue name, resolved to a URL on connect
    pub queue_name: String,

    /// Long-polling wait time in seconds (0-20)
    pub wait_time_seconds: i32,

    /// Visibility timeout override in seconds (queue default if unset)
    pub visibility_timeout: Option<i32>,
}

impl SqsQueueConfig {
    /// Create a new SQS queue configuration.
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            wait_time_seconds: 0,
            visibility_timeout: None,
        }
    }

    /// Set the long-polling wait time.
    pub fn with_wait_time(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = seconds.clamp(0, 20);
        self
    }

    /// Set the visibility timeout.
    pub fn with_visibility_timeout(mut self, seconds: i32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }
}

/// Message queue over an SQS queue.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    config: SqsQueueConfig,
}

impl SqsQueue {
    /// Create a queue from a client and an already resolved URL.
    pub fn new(client: Client, queue_url: impl Into<String>, config: SqsQueueConfig) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            config,
        }
    }

    /// Resolve the queue by name and connect to it.
    pub async fn connect(sdk_config: &SdkConfig, config: SqsQueueConfig) -> Result<Self> {
        let client = Client::new(sdk_config);
        let response = client
            .get_queue_url()
            .queue_name(&config.queue_name)
            .send()
            .await
            .map_err(|e| {
                QueueError::Connection(format!(
                    "Failed to resolve queue {}: {}",
                    config.queue_name,
                    DisplayErrorContext(&e)
                ))
            })?;

        let queue_url = response
            .queue_url()
            .ok_or_else(|| {
                QueueError::Connection(format!("No URL returned for queue {}", config.queue_name))
            })?
            .to_string();

        info!(queue = %config.queue_name, url = %queue_url, "Connected to queue");
        Ok(Self::new(client, queue_url, config))
    }

    /// The resolved queue URL.
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn send(&self, body: &str) -> Result<()> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                QueueError::Send(format!("SQS send failed: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<RawMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max.clamp(1, 10) as i32)
            .wait_time_seconds(self.config.wait_time_seconds)
            .set_visibility_timeout(self.config.visibility_timeout)
            .send()
            .await
            .map_err(|e| {
                QueueError::Receive(format!("SQS receive failed: {}", DisplayErrorContext(&e)))
            })?;

        let messages: Vec<RawMessage> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|msg| RawMessage {
                body: msg.body.unwrap_or_default(),
                receipt_handle: msg.receipt_handle.unwrap_or_default(),
            })
            .collect();

        debug!("Received {} messages from SQS", messages.len());
        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| {
                QueueError::Delete(format!("SQS delete failed: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }
}
