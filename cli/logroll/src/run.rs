//! Main execution logic for the logroll CLI.

use anyhow::{Context, Result};
use lr_aws::{AwsConfig, AwsSessions, SqsQueue, SqsQueueConfig};
use lr_producer::{Output, Producer, ProducerConfig, ProducerStats, QueueOutput, StdoutOutput};
use lr_types::S3Uri;
use lr_worker::{StatsSnapshot, Worker, WorkerConfig};
use std::sync::Arc;
use tracing::info;

use crate::args::{Cli, Command, EventArgs, ProducerArgs, WorkerArgs};
use crate::event::Event;

/// What a run produced, for the final summary.
pub enum Report {
    Producer(ProducerStats),
    Worker(StatsSnapshot),
}

/// Execute the subcommand given on the command line.
pub async fn execute(cli: Cli) -> Result<Report> {
    let aws: AwsConfig = cli.aws.into();

    match cli.command {
        Command::Producer(args) => run_producer(args, aws).await.map(Report::Producer),
        Command::Worker(args) => run_worker(args, aws).await.map(Report::Worker),
        Command::Event(args) => run_event(args, aws).await,
    }
}

async fn run_producer(args: ProducerArgs, aws: AwsConfig) -> Result<ProducerStats> {
    let config = ProducerConfig::new()
        .with_max_depth(args.max_depth)
        .with_window(args.window);
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    let sessions = Arc::new(AwsSessions::load(aws).await);

    if args.dry_run {
        let output = StdoutOutput::new(args.output_format.into());
        return Ok(produce(sessions, output, config, &args.s3_role, &args.prefixes).await);
    }

    let queue_name = args
        .queue_name
        .ok_or_else(|| anyhow::anyhow!("--queue-name is required unless --dry-run is set"))?;
    let queue = connect_queue(&sessions, SqsQueueConfig::new(queue_name)).await?;
    let output = QueueOutput::new(queue);
    Ok(produce(sessions, output, config, &args.s3_role, &args.prefixes).await)
}

async fn produce<O: Output>(
    sessions: Arc<AwsSessions>,
    output: O,
    config: ProducerConfig,
    role: &str,
    roots: &[S3Uri],
) -> ProducerStats {
    let producer = Producer::new(sessions, output, config);
    producer.run(role, roots).await
}

async fn run_worker(args: WorkerArgs, aws: AwsConfig) -> Result<StatsSnapshot> {
    let mut config = WorkerConfig::new()
        .with_message_count(args.count)
        .with_delete_sources(args.delete);
    if let Some(concurrency) = args.download_concurrency {
        config = config.with_download_concurrency(concurrency);
    }
    if let Some(dir) = args.work_dir {
        config = config.with_work_dir(dir);
    }
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    let sessions = Arc::new(AwsSessions::load(aws).await);
    let queue_config = SqsQueueConfig::new(args.queue_name).with_wait_time(args.wait_time);
    let queue = connect_queue(&sessions, queue_config).await?;

    let worker = Worker::new(config, queue, sessions);
    Ok(worker.run().await?)
}

/// Handle one event: archive every queue record with deletion enabled, or
/// produce tasks for the requested roots.
async fn run_event(args: EventArgs, aws: AwsConfig) -> Result<Report> {
    let event = Event::read(args.file.as_deref())?;

    let sessions = Arc::new(AwsSessions::load(aws).await);
    let queue = connect_queue(&sessions, SqsQueueConfig::new(args.queue_name)).await?;

    match event {
        Event::Records { records } => {
            info!(records = records.len(), "Handling queue records");
            let config = WorkerConfig::new()
                .with_message_count(records.len().max(1))
                .with_delete_sources(true);
            let worker = Worker::new(config, queue, sessions);
            for record in records {
                worker.handle_record(record.into()).await;
            }
            let stats = worker.stats();
            stats.complete();
            Ok(Report::Worker(stats.snapshot()))
        }
        Event::Produce { s3_role, prefixes } => {
            info!(role = %s3_role, roots = prefixes.len(), "Handling produce request");
            let output = QueueOutput::new(queue);
            let config = ProducerConfig::new();
            let stats = produce(sessions, output, config, &s3_role, &prefixes).await;
            Ok(Report::Producer(stats))
        }
    }
}

async fn connect_queue(sessions: &AwsSessions, config: SqsQueueConfig) -> Result<SqsQueue> {
    let name = config.queue_name.clone();
    SqsQueue::connect(sessions.sdk_config(), config)
        .await
        .with_context(|| format!("Failed to connect to queue {name}"))
}

