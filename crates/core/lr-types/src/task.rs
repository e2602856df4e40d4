//! Rollup task, the unit of work exchanged between producer and workers.

use lr_error::{QueueError, TaskError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Prefix of every archive object name.
pub const TARBALL_PREFIX: &str = "rollup";

/// Largest task that fits in one queue message.
///
/// SQS caps a message at 256 KiB, which holds roughly 6500 log basenames.
pub const MAX_MESSAGE_BASENAMES: usize = 6000;

/// Largest number of keys accepted by one `DeleteObjects` call.
pub const MAX_DELETE_BATCH: usize = 1000;

/// A batch of log objects sharing one bucket, one directory and one date.
///
/// Serialized as-is into queue messages. The field names on the wire are
/// `s3_role`, `bucket_name`, `common_prefix` and `basenames`; renaming any of
/// them breaks messages already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupTask {
    /// Role to assume for every object store call made for this task
    #[serde(rename = "s3_role")]
    pub role: String,

    /// Bucket holding the objects
    #[serde(rename = "bucket_name")]
    pub bucket: String,

    /// Parent directory of every object, ends with the separator (or is empty)
    pub common_prefix: String,

    /// Object names relative to `common_prefix`, in listing order
    pub basenames: Vec<String>,
}

impl RollupTask {
    /// Create a new task.
    pub fn new(
        role: impl Into<String>,
        bucket: impl Into<String>,
        common_prefix: impl Into<String>,
        basenames: Vec<String>,
    ) -> Self {
        Self {
            role: role.into(),
            bucket: bucket.into(),
            common_prefix: common_prefix.into(),
            basenames,
        }
    }

    /// Number of objects in the task.
    pub fn len(&self) -> usize {
        self.basenames.len()
    }

    /// Returns true if the task holds no objects.
    pub fn is_empty(&self) -> bool {
        self.basenames.is_empty()
    }

    /// Full object keys, in basename order.
    pub fn object_keys(&self) -> Vec<String> {
        self.basenames
            .iter()
            .map(|bn| format!("{}{}", self.common_prefix, bn))
            .collect()
    }

    /// The `YYYY-MM-DD` date shared by the task's objects.
    pub fn date_str(&self) -> Result<&str, TaskError> {
        let first = self.basenames.first().ok_or(TaskError::EmptyBasenames)?;
        first
            .get(..10)
            .filter(|date| is_date_shaped(date))
            .ok_or_else(|| TaskError::InvalidDate(first.clone()))
    }

    /// Check that the task can be archived safely.
    ///
    /// Basenames name local scratch files as well as objects, so each must be
    /// a single path component, and no basename may repeat.
    pub fn validate(&self) -> Result<(), TaskError> {
        self.date_str()?;

        let mut seen = HashSet::with_capacity(self.basenames.len());
        for basename in &self.basenames {
            if !is_plain_name(basename) {
                return Err(TaskError::InvalidBasename(basename.clone()));
            }
            if !seen.insert(basename.as_str()) {
                return Err(TaskError::DuplicateBasename(basename.clone()));
            }
        }
        Ok(())
    }

    /// Key of the archive this task rolls up into.
    ///
    /// A fresh random suffix is drawn on every call, so duplicate deliveries of
    /// the same task never overwrite each other. Callers that need the key more
    /// than once must keep the first result.
    pub fn tarball_key(&self) -> Result<String, TaskError> {
        let date_str = self.date_str()?;
        let suffix: u32 = rand::rng().random();
        Ok(format!(
            "{}{}-{}-{:08x}.tgz",
            self.common_prefix, TARBALL_PREFIX, date_str, suffix
        ))
    }

    /// Split into tasks of at most `chunk_size` objects, preserving order.
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn split(&self, chunk_size: usize) -> impl Iterator<Item = RollupTask> + '_ {
        self.basenames
            .chunks(chunk_size.max(1))
            .map(move |chunk| RollupTask {
                role: self.role.clone(),
                bucket: self.bucket.clone(),
                common_prefix: self.common_prefix.clone(),
                basenames: chunk.to_vec(),
            })
    }

    /// Encode the task as a queue message body.
    pub fn to_message(&self) -> Result<String, QueueError> {
        serde_json::to_string(self)
            .map_err(|e| QueueError::Serialize(format!("Failed to encode {self}: {e}")))
    }

    /// Decode a queue message body.
    ///
    /// Tasks failing [`validate`](Self::validate) are rejected here so that no
    /// worker ever derives a date, archive key or scratch path from them.
    pub fn from_message(body: &str) -> Result<Self, QueueError> {
        let task: RollupTask = serde_json::from_str(body)
            .map_err(|e| QueueError::Deserialize(format!("Invalid task message: {e}")))?;

        task.validate()
            .map_err(|e| QueueError::Deserialize(format!("Invalid task message: {e}")))?;

        Ok(task)
    }
}

/// `YYYY-MM-DD` shape: ASCII digits with dashes at positions 4 and 7.
fn is_date_shaped(date: &str) -> bool {
    date.len() == 10
        && date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn is_plain_name(basename: &str) -> bool {
    !basename.is_empty()
        && basename != "."
        && basename != ".."
        && !basename.contains(['/', '\\', '\0'])
}

impl fmt::Display for RollupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<RollupTask with {} files of {} @ s3://{}/{}>",
            self.len(),
            self.date_str().unwrap_or("?"),
            self.bucket,
            self.common_prefix
        )
    }
}
