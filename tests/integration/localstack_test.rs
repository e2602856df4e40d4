//! S3 and SQS adapters against LocalStack.

use crate::common::{LocalStackTestContext, log_name, read_tarball};
use lr_aws::{AwsSessions, SqsQueue, SqsQueueConfig};
use lr_producer::{Producer, ProducerConfig, QueueOutput};
use lr_traits::{MessageQueue, ObjectStore};
use lr_types::{RollupTask, S3Uri};
use lr_worker::{METADATA_FILE_COUNT, Worker, WorkerConfig};
use std::collections::HashMap;
use std::sync::Arc;

const ROLE: &str = "arn:aws:iam::000000000000:role/s3-rollup-bucket-access";

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_s3_store_round_trip() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "logroll-store-test";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.empty_bucket(bucket).await.unwrap();
    ctx.put_object(bucket, "log/a.com/one", b"first").await.unwrap();
    ctx.put_object(bucket, "log/b.com/two", b"second").await.unwrap();
    ctx.put_object(bucket, "log/root", b"root").await.unwrap();
    let store = ctx.store();

    let listing = store.list(bucket, "log/", Some("/")).await.unwrap();
    assert_eq!(listing.common_prefixes, vec!["log/a.com/", "log/b.com/"]);
    assert_eq!(listing.objects.len(), 1);
    assert_eq!(listing.objects[0].key, "log/root");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one");
    let written = store
        .get_object_to_file(bucket, "log/a.com/one", &path)
        .await
        .unwrap();
    assert_eq!(written, 5);
    assert_eq!(std::fs::read(&path).unwrap(), b"first");

    let missing = store
        .get_object_to_file(bucket, "log/missing", &dir.path().join("missing"))
        .await;
    assert!(missing.is_err());

    let metadata = HashMap::from([(METADATA_FILE_COUNT.to_string(), "1".to_string())]);
    store
        .put_object_from_file(bucket, "log/copy", &path, &metadata)
        .await
        .unwrap();
    assert_eq!(ctx.get_object(bucket, "log/copy").await, b"first");

    let keys = vec!["log/copy".to_string(), "log/never-existed".to_string()];
    let report = store.delete_objects(bucket, &keys).await.unwrap();
    assert!(report.failed.is_empty());
    assert!(ctx.list_keys(bucket, "log/copy").await.unwrap().is_empty());

    let region = store.bucket_region(bucket).await.unwrap();
    assert!(region.is_empty() || region == "us-east-1");
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_sqs_queue_send_receive_delete() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue_url = ctx.create_queue("logroll-queue-test").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();
    let config = SqsQueueConfig::new("logroll-queue-test").with_wait_time(1);
    let queue = SqsQueue::connect(&ctx.sdk_config, config).await.unwrap();
    assert_eq!(queue.queue_url(), queue_url);

    let task = RollupTask::new(
        ROLE,
        "bucket1",
        "log/",
        vec![log_name("2022-06-30", 0)],
    );
    queue.send(&task.to_message().unwrap()).await.unwrap();

    let messages = queue.receive(10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(RollupTask::from_message(&messages[0].body).unwrap(), task);

    queue.delete(&messages[0].receipt_handle).await.unwrap();
    ctx.delete_queue(&queue_url).await.ok();
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_rollup_end_to_end() {
    let ctx = LocalStackTestContext::new().await;
    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "logroll-e2e-test";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.empty_bucket(bucket).await.unwrap();
    for n in 0..3 {
        let name = log_name("2022-06-30", n);
        ctx.put_object(bucket, &format!("example.com/{name}"), name.as_bytes())
            .await
            .unwrap();
    }
    let queue_url = ctx.create_queue("logroll-e2e-test").await.unwrap();
    ctx.purge_queue(&queue_url).await.ok();

    let sessions = Arc::new(AwsSessions::new(ctx.config.clone(), ctx.sdk_config.clone()));
    let queue = SqsQueue::connect(&ctx.sdk_config, SqsQueueConfig::new("logroll-e2e-test"))
        .await
        .unwrap();
    let producer = Producer::new(sessions.clone(), QueueOutput::new(queue), ProducerConfig::new());
    let root = S3Uri::from_segments(bucket, "");
    let produced = producer.run(ROLE, &[root]).await;
    assert!(!produced.has_errors(), "{:?}", produced.errors);
    assert_eq!(produced.tasks_queued, 1);

    let queue = SqsQueue::connect(
        &ctx.sdk_config,
        SqsQueueConfig::new("logroll-e2e-test").with_wait_time(1),
    )
    .await
    .unwrap();
    let config = WorkerConfig::new().with_delete_sources(true);
    let stats = Worker::new(config, queue, sessions).run().await.unwrap();
    assert_eq!(stats.tasks_succeeded, 1);

    let keys = ctx.list_keys(bucket, "").await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("example.com/rollup-2022-06-30-"));
    let members = read_tarball(&ctx.get_object(bucket, &keys[0]).await);
    assert_eq!(members.len(), 3);
    assert_eq!(members[0].0, log_name("2022-06-30", 0));

    ctx.delete_queue(&queue_url).await.ok();
}
