//! Producer and worker running against the in-memory store and queue.

use crate::common::{log_name, put_logs, read_tarball};
use chrono::NaiveDate;
use lr_producer::{Producer, ProducerConfig, QueueOutput};
use lr_traits::RawMessage;
use lr_traits::memory::{MemoryObjectStore, MemoryQueue, MemorySessions};
use lr_types::{RollupTask, S3Uri};
use lr_worker::{METADATA_FILE_COUNT, METADATA_FILE_SIZE, Worker, WorkerConfig};
use std::sync::Arc;

const ROLE: &str = "arn:aws:iam::123456789012:role/s3-rollup-bucket-access";
const BUCKET: &str = "access-logs";

struct Rollup {
    store: Arc<MemoryObjectStore>,
    queue: Arc<MemoryQueue>,
    sessions: Arc<MemorySessions>,
}

impl Rollup {
    fn new() -> Self {
        let store = Arc::new(MemoryObjectStore::new());
        store.create_bucket(BUCKET, "");
        let sessions = Arc::new(MemorySessions::new(store.clone(), "us-east-1"));
        Self {
            store,
            queue: Arc::new(MemoryQueue::new()),
            sessions,
        }
    }

    async fn produce(&self, root: &str) -> lr_producer::ProducerStats {
        let today = NaiveDate::from_ymd_opt(2022, 7, 2).unwrap();
        let config = ProducerConfig::new().with_today(today);
        let producer = Producer::new(
            self.sessions.clone(),
            QueueOutput::new(self.queue.clone()),
            config,
        );
        producer.run(ROLE, &[S3Uri::parse(root).unwrap()]).await
    }

    fn worker(&self, count: usize, delete_sources: bool) -> Worker<Arc<MemoryQueue>> {
        let config = WorkerConfig::new()
            .with_message_count(count)
            .with_delete_sources(delete_sources);
        Worker::new(config, self.queue.clone(), self.sessions.clone())
    }

    fn archives(&self) -> Vec<String> {
        self.store
            .keys(BUCKET)
            .into_iter()
            .filter(|key| key.ends_with(".tgz"))
            .collect()
    }
}

#[tokio::test]
async fn test_rollup_archives_finished_days() {
    let rollup = Rollup::new();
    let dates = ["2022-06-29", "2022-06-30", "2022-07-01", "2022-07-02"];
    put_logs(&rollup.store, BUCKET, "log/example.com/", &dates, 4);
    rollup.store.put(BUCKET, "log/example.com/robots.txt", b"skip");

    let produced = rollup.produce("s3://access-logs/log/").await;
    assert!(!produced.has_errors());
    assert_eq!(produced.tasks_queued, 3);
    assert_eq!(produced.objects_queued, 12);

    let stats = rollup.worker(10, false).run().await.unwrap();

    assert_eq!(stats.tasks_succeeded, 3);
    assert_eq!(stats.files_archived, 12);
    assert!(!stats.has_failures());
    assert_eq!(rollup.queue.visible_len(), 0);
    assert_eq!(rollup.queue.in_flight_len(), 0);

    let archives = rollup.archives();
    assert_eq!(archives.len(), 3);
    let first = archives
        .iter()
        .find(|key| key.starts_with("log/example.com/rollup-2022-06-29-"))
        .unwrap();

    let data = rollup.store.object(BUCKET, first).unwrap();
    let members = read_tarball(&data);
    let names: Vec<&str> = members.iter().map(|(name, _)| name.as_str()).collect();
    let expected: Vec<String> = (0..4).map(|n| log_name("2022-06-29", n)).collect();
    assert_eq!(names, expected);
    assert_eq!(members[2].1, log_name("2022-06-29", 2).into_bytes());

    let metadata = rollup.store.metadata(BUCKET, first).unwrap();
    assert_eq!(metadata[METADATA_FILE_COUNT], "4");
    let total: usize = expected.iter().map(String::len).sum();
    assert_eq!(metadata[METADATA_FILE_SIZE], total.to_string());

    // Sources stay in place without deletion; today's logs are never touched.
    assert!(rollup.store.object(BUCKET, &format!("log/example.com/{}", expected[0])).is_some());
    let today = format!("log/example.com/{}", log_name("2022-07-02", 0));
    assert!(rollup.store.object(BUCKET, &today).is_some());
}

#[tokio::test]
async fn test_rollup_with_deletion_is_idempotent() {
    let rollup = Rollup::new();
    put_logs(&rollup.store, BUCKET, "", &["2022-06-30", "2022-07-01"], 5);

    rollup.produce("s3://access-logs/").await;
    let stats = rollup.worker(5, true).run().await.unwrap();

    assert_eq!(stats.tasks_succeeded, 2);
    assert_eq!(stats.objects_deleted, 10);
    let keys = rollup.store.keys(BUCKET);
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|key| key.starts_with("rollup-") && key.ends_with(".tgz")));

    // Archives are not logs, so a second pass finds nothing to do.
    let second = rollup.produce("s3://access-logs/").await;
    assert!(!second.has_errors());
    assert_eq!(second.tasks_queued, 0);
    assert_eq!(rollup.queue.visible_len(), 0);
}

#[tokio::test]
async fn test_failed_task_is_redelivered() {
    let rollup = Rollup::new();
    put_logs(&rollup.store, BUCKET, "a.com/", &["2022-06-30"], 3);
    put_logs(&rollup.store, BUCKET, "b.com/", &["2022-06-30"], 3);
    rollup
        .store
        .fail_get(&format!("a.com/{}", log_name("2022-06-30", 1)));

    rollup.produce("s3://access-logs/").await;
    let stats = rollup.worker(2, true).run().await.unwrap();

    assert_eq!(stats.tasks_succeeded, 1);
    assert_eq!(stats.tasks_failed, 1);
    assert!(stats.has_failures());
    assert_eq!(rollup.archives().len(), 1);
    assert!(rollup.archives()[0].starts_with("b.com/"));

    // The failed task's sources are untouched and its message comes back.
    assert_eq!(rollup.store.keys(BUCKET).len(), 4);
    assert_eq!(rollup.queue.in_flight_len(), 1);
    rollup.queue.expire_in_flight();
    let body = &rollup.queue.visible_bodies()[0];
    assert_eq!(RollupTask::from_message(body).unwrap().common_prefix, "a.com/");
}

#[tokio::test]
async fn test_duplicate_delivery_writes_separate_archives() {
    let rollup = Rollup::new();
    put_logs(&rollup.store, BUCKET, "", &["2022-06-30"], 2);
    rollup.produce("s3://access-logs/").await;
    let body = rollup.queue.visible_bodies()[0].clone();

    let worker = rollup.worker(1, false);
    for handle in ["rh-dup-1", "rh-dup-2"] {
        worker
            .handle_record(RawMessage {
                body: body.clone(),
                receipt_handle: handle.to_string(),
            })
            .await;
    }

    assert_eq!(worker.stats().tasks_succeeded(), 2);
    assert_eq!(rollup.archives().len(), 2);
}

#[tokio::test]
async fn test_malformed_message_is_dropped() {
    let rollup = Rollup::new();
    put_logs(&rollup.store, BUCKET, "", &["2022-06-30"], 2);
    lr_traits::MessageQueue::send(&rollup.queue, "not a task").await.unwrap();
    rollup.produce("s3://access-logs/").await;

    let stats = rollup.worker(2, false).run().await.unwrap();

    assert_eq!(stats.malformed_messages, 1);
    assert_eq!(stats.tasks_succeeded, 1);
    assert_eq!(rollup.queue.visible_len(), 0);
    assert_eq!(rollup.queue.in_flight_len(), 0);
}

#[tokio::test]
async fn test_large_day_is_split_across_tasks() {
    let rollup = Rollup::new();
    put_logs(&rollup.store, BUCKET, "big/", &["2022-06-30"], 6500);

    let produced = rollup.produce("s3://access-logs/big/").await;

    assert_eq!(produced.tasks_queued, 2);
    let sizes: Vec<usize> = rollup
        .queue
        .visible_bodies()
        .iter()
        .map(|body| RollupTask::from_message(body).unwrap().len())
        .collect();
    assert_eq!(sizes, vec![6000, 500]);

    let stats = rollup.worker(2, true).run().await.unwrap();

    assert_eq!(stats.tasks_succeeded, 2);
    assert_eq!(stats.files_archived, 6500);
    assert_eq!(rollup.store.delete_batches().len(), 7);
    assert_eq!(rollup.store.keys(BUCKET).len(), 2);
}
