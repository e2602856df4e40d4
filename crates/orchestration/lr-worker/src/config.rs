//! Configuration types for the worker.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound of the default download pool.
const MAX_DEFAULT_DOWNLOADS: usize = 32;

/// Configuration for a worker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Messages to handle before the run ends
    pub message_count: usize,

    /// Delete source objects once their archive is uploaded
    pub delete_sources: bool,

    /// Concurrent downloads per task
    pub download_concurrency: usize,

    /// Parent of the per-task scratch directories (system temp dir if unset)
    pub work_dir: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            message_count: 1,
            delete_sources: false,
            download_concurrency: default_download_concurrency(),
            work_dir: None,
        }
    }
}

impl WorkerConfig {
    /// Create a new worker configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of messages to handle.
    pub fn with_message_count(mut self, count: usize) -> Self {
        self.message_count = count;
        self
    }

    /// Enable or disable deletion of archived source objects.
    pub fn with_delete_sources(mut self, delete: bool) -> Self {
        self.delete_sources = delete;
        self
    }

    /// Set the number of concurrent downloads per task.
    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency;
        self
    }

    /// Set the parent directory for scratch space.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.message_count == 0 {
            return Err("message_count must be at least 1".to_string());
        }
        if self.download_concurrency == 0 {
            return Err("download_concurrency must be at least 1".to_string());
        }
        if let Some(dir) = &self.work_dir {
            if !dir.is_dir() {
                return Err(format!("work_dir {} is not a directory", dir.display()));
            }
        }
        Ok(())
    }
}

/// Downloads are I/O bound, so the pool is sized past the CPU count.
fn default_download_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(MAX_DEFAULT_DOWNLOADS)
}
