//! Statistics for worker runs.

use chrono::{DateTime, Duration, Utc};
use lr_error::ErrorCategory;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::pipeline::ArchiveOutcome;

/// Statistics collected during a worker run.
///
/// Counters are atomic so the stats can be shared behind an `Arc` and read
/// while a run is in progress.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// When processing started
    started_at: Option<DateTime<Utc>>,

    /// When processing completed
    completed_at: Mutex<Option<DateTime<Utc>>>,

    /// Tasks archived and acknowledged
    tasks_succeeded: AtomicU64,

    /// Tasks left on the queue for redelivery
    tasks_failed: AtomicU64,

    /// Source objects written into archives
    files_archived: AtomicU64,

    /// Total size of the downloaded source objects
    bytes_downloaded: AtomicU64,

    /// Total size of the uploaded archives
    archive_bytes_uploaded: AtomicU64,

    /// Source objects removed after archiving
    objects_deleted: AtomicU64,

    /// Source objects the store refused to delete
    delete_failures: AtomicU64,

    /// Messages dropped because their body was not a task
    malformed_messages: AtomicU64,

    /// Number of transient errors encountered
    transient_errors: AtomicU64,

    /// Number of permanent errors encountered
    permanent_errors: AtomicU64,
}

impl WorkerStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark processing as complete with the current time.
    pub fn complete(&self) {
        *self.completed_at.lock() = Some(Utc::now());
    }

    /// Record a task that was archived.
    pub fn record_success(&self, outcome: &ArchiveOutcome) {
        self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
        self.files_archived
            .fetch_add(outcome.file_count as u64, Ordering::Relaxed);
        self.bytes_downloaded
            .fetch_add(outcome.bytes_downloaded, Ordering::Relaxed);
        self.archive_bytes_uploaded
            .fetch_add(outcome.archive_bytes, Ordering::Relaxed);
        self.objects_deleted
            .fetch_add(outcome.deleted as u64, Ordering::Relaxed);
        self.delete_failures
            .fetch_add(outcome.delete_failures as u64, Ordering::Relaxed);
    }

    /// Record a failed task.
    pub fn record_failure(&self, category: ErrorCategory) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        match category {
            ErrorCategory::Transient => self.transient_errors.fetch_add(1, Ordering::Relaxed),
            ErrorCategory::Permanent => self.permanent_errors.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a dropped malformed message.
    pub fn record_malformed(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
        self.permanent_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total duration of the worker run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, *self.completed_at.lock()) {
            (Some(start), Some(end)) => Some(end - start),
            (Some(start), None) => Some(Utc::now() - start),
            _ => None,
        }
    }

    /// Get the number of tasks archived.
    pub fn tasks_succeeded(&self) -> u64 {
        self.tasks_succeeded.load(Ordering::Relaxed)
    }

    /// Get the number of tasks that failed.
    pub fn tasks_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::Relaxed)
    }

    /// Get the number of messages handled, malformed ones included.
    pub fn messages_handled(&self) -> u64 {
        self.tasks_succeeded() + self.tasks_failed() + self.malformed_messages()
    }

    /// Get the number of malformed messages dropped.
    pub fn malformed_messages(&self) -> u64 {
        self.malformed_messages.load(Ordering::Relaxed)
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            completed_at: *self.completed_at.lock(),
            tasks_succeeded: self.tasks_succeeded(),
            tasks_failed: self.tasks_failed(),
            files_archived: self.files_archived.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            archive_bytes_uploaded: self.archive_bytes_uploaded.load(Ordering::Relaxed),
            objects_deleted: self.objects_deleted.load(Ordering::Relaxed),
            delete_failures: self.delete_failures.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages(),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            permanent_errors: self.permanent_errors.load(Ordering::Relaxed),
        }
    }
}

/// A serializable snapshot of worker statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub tasks_succeeded: u64,
    pub tasks_failed: u64,
    pub files_archived: u64,
    pub bytes_downloaded: u64,
    pub archive_bytes_uploaded: u64,
    pub objects_deleted: u64,
    pub delete_failures: u64,
    pub malformed_messages: u64,
    pub transient_errors: u64,
    pub permanent_errors: u64,
}

impl StatsSnapshot {
    /// Get the total duration of the worker run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// True if any task failed or any message had to be dropped.
    pub fn has_failures(&self) -> bool {
        self.tasks_failed > 0 || self.malformed_messages > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(files: usize, deleted: usize, delete_failures: usize) -> ArchiveOutcome {
        ArchiveOutcome {
            tarball_key: "example.com/rollup-2022-07-01-0badf00d.tgz".to_string(),
            file_count: files,
            bytes_downloaded: files as u64 * 100,
            archive_bytes: 64,
            deleted,
            delete_failures,
        }
    }

    #[test]
    fn test_stats_new() {
        let stats = WorkerStats::new();
        let snapshot = stats.snapshot();

        assert!(snapshot.started_at.is_some());
        assert!(snapshot.completed_at.is_none());
        assert_eq!(snapshot.tasks_succeeded, 0);
        assert!(!snapshot.has_failures());
    }

    #[test]
    fn test_stats_record_success() {
        let stats = WorkerStats::new();
        stats.record_success(&outcome(3, 3, 0));
        stats.record_success(&outcome(2, 1, 1));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.tasks_succeeded, 2);
        assert_eq!(snapshot.files_archived, 5);
        assert_eq!(snapshot.bytes_downloaded, 500);
        assert_eq!(snapshot.archive_bytes_uploaded, 128);
        assert_eq!(snapshot.objects_deleted, 4);
        assert_eq!(snapshot.delete_failures, 1);
        assert!(!snapshot.has_failures());
    }

    #[test]
    fn test_stats_record_failures() {
        let stats = WorkerStats::new();
        stats.record_failure(ErrorCategory::Transient);
        stats.record_failure(ErrorCategory::Permanent);
        stats.record_malformed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.tasks_failed, 2);
        assert_eq!(snapshot.malformed_messages, 1);
        assert_eq!(snapshot.transient_errors, 1);
        assert_eq!(snapshot.permanent_errors, 2);
        assert_eq!(stats.messages_handled(), 3);
        assert!(snapshot.has_failures());
    }

    #[test]
    fn test_stats_duration() {
        let stats = WorkerStats::new();
        stats.complete();

        let snapshot = stats.snapshot();
        assert!(snapshot.duration().unwrap().num_milliseconds() >= 0);
        assert!(stats.duration().is_some());
    }
}
