//! Configuration types for the producer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest total object size of one task: 5 GiB.
pub const DEFAULT_MAX_TASK_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Largest number of objects in one task.
pub const DEFAULT_MAX_TASK_ITEMS: usize = 6000;

/// Configuration for a production run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Deepest folder level explored below a root
    pub max_depth: usize,

    /// Number of prefixes whose task streams are open at once
    pub window: usize,

    /// Maximum cumulative object size of a task
    pub max_task_bytes: u64,

    /// Maximum number of objects in a task
    pub max_task_items: usize,

    /// Fixed "today" (UTC). Objects dated on or after it are left alone.
    /// `None` uses the current UTC date.
    pub today: Option<NaiveDate>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            window: 20,
            max_task_bytes: DEFAULT_MAX_TASK_BYTES,
            max_task_items: DEFAULT_MAX_TASK_ITEMS,
            today: None,
        }
    }
}

impl ProducerConfig {
    /// Create a new producer configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum folder depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the number of concurrently open prefixes.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set the maximum task size in bytes.
    pub fn with_max_task_bytes(mut self, max_task_bytes: u64) -> Self {
        self.max_task_bytes = max_task_bytes;
        self
    }

    /// Set the maximum number of objects per task.
    pub fn with_max_task_items(mut self, max_task_items: usize) -> Self {
        self.max_task_items = max_task_items;
        self
    }

    /// Pin the current date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The date that bounds which objects are old enough to roll up.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.window == 0 {
            return Err("window must be greater than 0".to_string());
        }
        if self.max_task_bytes == 0 {
            return Err("max_task_bytes must be greater than 0".to_string());
        }
        if self.max_task_items == 0 {
            return Err("max_task_items must be greater than 0".to_string());
        }
        Ok(())
    }
}
