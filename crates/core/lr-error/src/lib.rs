//! Error types and classification for logroll.
//!
//! This crate provides:
//! - [`LrError`] - Top-level error enum for producer and worker runs
//! - Domain-specific errors ([`StoreError`], [`QueueError`], [`TaskError`], [`ArchiveError`])
//! - [`ErrorCategory`] and [`classify_error`] for reporting whether a failure
//!   is worth waiting out (queue redelivery) or needs an operator

use thiserror::Error;

/// Top-level error type for logroll.
#[derive(Error, Debug)]
pub enum LrError {
    /// Object store errors (list, get, put, delete, location)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Queue errors (send, receive, delete)
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Rollup task errors (empty task, bad URI)
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Archive build errors
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// A directory-only operation was called on a file-like path
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Target bucket lives outside the region of the assumed role
    #[error(
        "Bucket {bucket} ({bucket_region}) is not in current region ({session_region})"
    )]
    RegionMismatch {
        bucket: String,
        bucket_region: String,
        session_region: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Object store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Listing a prefix failed
    #[error("List failed: {0}")]
    List(String),

    /// Downloading an object failed
    #[error("Get failed for {key}: {reason}")]
    Get { key: String, reason: String },

    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Uploading an object failed
    #[error("Put failed for {key}: {reason}")]
    Put { key: String, reason: String },

    /// Batch delete request failed
    #[error("Delete failed: {0}")]
    Delete(String),

    /// Bucket location lookup failed
    #[error("Location lookup failed: {0}")]
    Location(String),

    /// Access denied
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Could not obtain credentials for a role
    #[error("Credentials unavailable: {0}")]
    Credentials(String),
}

/// Queue errors.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Queue could not be resolved or reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Failed to send a message
    #[error("Send failed: {0}")]
    Send(String),

    /// Failed to receive messages
    #[error("Receive failed: {0}")]
    Receive(String),

    /// Failed to delete (acknowledge) a message
    #[error("Delete failed: {0}")]
    Delete(String),

    /// Message body is not a valid task
    #[error("Deserialization failed: {0}")]
    Deserialize(String),

    /// Task could not be encoded
    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Rollup task errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// A task needs at least one basename to derive its date and archive key
    #[error("basenames cannot be empty")]
    EmptyBasenames,

    /// The first basename does not start with a `YYYY-MM-DD` date
    #[error("basename {0:?} does not start with a date")]
    InvalidDate(String),

    /// A basename that is not a single path component
    #[error("basename {0:?} is not a plain object name")]
    InvalidBasename(String),

    /// The same basename listed twice in one task
    #[error("basename {0:?} appears more than once")]
    DuplicateBasename(String),

    /// Not an `s3://bucket/key` URI
    #[error("Invalid S3 URI {0:?}: it should start with s3://")]
    InvalidUri(String),
}

/// Archive build errors.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Writing the tarball failed
    #[error("Build failed: {0}")]
    Build(String),

    /// The blocking archive job panicked or was cancelled
    #[error("Archive job aborted: {0}")]
    Join(String),
}

/// Error classification for reporting.
///
/// Retries are never performed in-process; a failed task stays on the queue
/// and comes back after the visibility timeout. The category tells operators
/// whether that redelivery can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Likely to succeed on redelivery
    ///
    /// Examples: network timeout, S3 SlowDown, SQS throttling
    Transient,

    /// Will fail again on redelivery
    ///
    /// Examples: region mismatch, malformed message, missing object
    Permanent,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "Transient"),
            Self::Permanent => write!(f, "Permanent"),
        }
    }
}

/// Classifies an error for statistics and logging.
pub fn classify_error(error: &LrError) -> ErrorCategory {
    match error {
        LrError::Store(e) => classify_store_error(e),
        LrError::Queue(e) => classify_queue_error(e),
        LrError::Task(_) => ErrorCategory::Permanent,
        LrError::Archive(ArchiveError::Build(_)) => ErrorCategory::Transient,
        LrError::Archive(ArchiveError::Join(_)) => ErrorCategory::Transient,
        LrError::NotADirectory(_) => ErrorCategory::Permanent,
        LrError::RegionMismatch { .. } => ErrorCategory::Permanent,
        LrError::Config(_) => ErrorCategory::Permanent,
        LrError::Io(_) => ErrorCategory::Transient,
        LrError::Other(e) => classify_message(&e.to_string()),
    }
}

fn classify_store_error(error: &StoreError) -> ErrorCategory {
    match error {
        StoreError::NotFound(_) => ErrorCategory::Permanent,
        StoreError::AccessDenied(_) => ErrorCategory::Permanent,
        StoreError::Credentials(_) => ErrorCategory::Permanent,
        StoreError::Get { reason, .. } | StoreError::Put { reason, .. } => {
            classify_message(reason)
        }
        StoreError::List(msg) | StoreError::Delete(msg) | StoreError::Location(msg) => {
            classify_message(msg)
        }
    }
}

fn classify_queue_error(error: &QueueError) -> ErrorCategory {
    match error {
        QueueError::Connection(_) => ErrorCategory::Transient,
        QueueError::Send(_) => ErrorCategory::Transient,
        QueueError::Receive(_) => ErrorCategory::Transient,
        QueueError::Delete(_) => ErrorCategory::Transient,
        QueueError::Deserialize(_) => ErrorCategory::Permanent,
        QueueError::Serialize(_) => ErrorCategory::Permanent,
    }
}

fn classify_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();

    if lower.contains("nosuchkey")
        || lower.contains("nosuchbucket")
        || lower.contains("accessdenied")
        || lower.contains("403")
        || lower.contains("404")
    {
        ErrorCategory::Permanent
    } else {
        ErrorCategory::Transient
    }
}

/// Result type alias using LrError.
pub type Result<T> = std::result::Result<T, LrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification_not_found() {
        let error = LrError::Store(StoreError::NotFound("logs/2022-07-01-00-00-00-AB".into()));
        assert_eq!(classify_error(&error), ErrorCategory::Permanent);
    }

    #[test]
    fn test_error_classification_throttled_get() {
        let error = LrError::Store(StoreError::Get {
            key: "logs/a".to_string(),
            reason: "SlowDown: Please reduce your request rate".to_string(),
        });
        assert_eq!(classify_error(&error), ErrorCategory::Transient);
    }

    #[test]
    fn test_error_classification_missing_key_in_reason() {
        let error = LrError::Store(StoreError::Get {
            key: "logs/a".to_string(),
            reason: "service error: NoSuchKey".to_string(),
        });
        assert_eq!(classify_error(&error), ErrorCategory::Permanent);
    }

    #[test]
    fn test_error_classification_region_mismatch() {
        let error = LrError::RegionMismatch {
            bucket: "bucket1".to_string(),
            bucket_region: "eu-west-1".to_string(),
            session_region: "us-east-1".to_string(),
        };
        assert_eq!(classify_error(&error), ErrorCategory::Permanent);
        assert!(error.to_string().contains("bucket1 (eu-west-1)"));
    }

    #[test]
    fn test_error_classification_queue() {
        let receive = LrError::Queue(QueueError::Receive("timeout".to_string()));
        let malformed = LrError::Queue(QueueError::Deserialize("bad json".to_string()));
        assert_eq!(classify_error(&receive), ErrorCategory::Transient);
        assert_eq!(classify_error(&malformed), ErrorCategory::Permanent);
    }

    #[test]
    fn test_task_error_display() {
        let error = LrError::Task(TaskError::EmptyBasenames);
        assert!(error.to_string().contains("basenames cannot be empty"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Transient.to_string(), "Transient");
        assert_eq!(ErrorCategory::Permanent.to_string(), "Permanent");
    }
}
