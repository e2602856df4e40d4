//! AWS adapters for logroll.
//!
//! - [`S3Store`] - [`ObjectStore`](lr_traits::ObjectStore) over an S3 client
//! - [`SqsQueue`] - [`MessageQueue`](lr_traits::MessageQueue) over an SQS queue
//! - [`AwsSessions`] - [`SessionProvider`](lr_traits::SessionProvider) assuming
//!   roles through STS, with credentials refreshed by the SDK
//!
//! Every client is built from one [`AwsConfig`], which also carries the
//! LocalStack endpoint override used by the integration tests.

mod config;
mod s3;
mod session;
mod sqs;

pub use config::AwsConfig;
pub use s3::S3Store;
pub use session::AwsSessions;
pub use sqs::{SqsQueue, SqsQueueConfig};
