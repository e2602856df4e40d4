//! Statistics for production runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Statistics collected during a production run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProducerStats {
    /// When production started
    pub started_at: Option<DateTime<Utc>>,

    /// When production completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Roots processed without error
    pub roots_processed: usize,

    /// Log prefixes found below the roots
    pub prefixes_discovered: usize,

    /// Log prefixes whose tasks were all produced
    pub prefixes_finished: usize,

    /// Tasks handed to the output
    pub tasks_queued: usize,

    /// Log objects covered by those tasks
    pub objects_queued: usize,

    /// Total size of those objects
    pub bytes_queued: u64,

    /// Errors encountered, one per failed root
    pub errors: Vec<String>,
}

impl ProducerStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark production as complete with the current time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Record a task handed to the output.
    pub fn record_task(&mut self, objects: usize, bytes: u64) {
        self.tasks_queued += 1;
        self.objects_queued += objects;
        self.bytes_queued += bytes;
    }

    /// Record the prefix counts of one root.
    pub fn record_prefixes(&mut self, discovered: usize, finished: usize) {
        self.prefixes_discovered += discovered;
        self.prefixes_finished += finished;
    }

    /// Record a root that was processed completely.
    pub fn record_root(&mut self) {
        self.roots_processed += 1;
    }

    /// Record an error.
    pub fn record_error(&mut self, error: impl ToString) {
        self.errors.push(error.to_string());
    }

    /// Get the duration of the run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
