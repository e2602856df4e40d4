//! CLI argument definitions for logroll.

use clap::{Args, Parser, Subcommand, ValueEnum};
use lr_aws::AwsConfig;
use lr_types::S3Uri;
use std::path::PathBuf;

/// Roll S3 server access logs up into per-day tarballs.
///
/// The producer walks the given prefixes, groups every finished day of logs
/// into rollup tasks and queues them. Workers take tasks off the queue, pack
/// each into one `.tgz` next to the logs and optionally delete the originals.
///
/// ## Examples
///
/// Queue tasks for two log roots:
///   logroll producer --queue-name rollup --s3-role arn:aws:iam::123:role/logs \
///     --prefixes s3://logs-a/ s3://logs-b/access/
///
/// Print the tasks instead of queuing them:
///   logroll producer --dry-run --s3-role arn:aws:iam::123:role/logs --prefixes s3://logs-a/
///
/// Archive up to 100 tasks and delete the archived logs:
///   logroll worker --queue-name rollup --count 100 --delete
///
/// Handle a Lambda-style event:
///   logroll event --queue-name rollup --file event.json
#[derive(Parser, Debug)]
#[command(name = "logroll")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub aws: AwsArgs,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover log prefixes and queue rollup tasks
    Producer(ProducerArgs),

    /// Archive queued rollup tasks
    Worker(WorkerArgs),

    /// Handle one JSON event (queue records or a produce request)
    Event(EventArgs),
}

/// Arguments of the `producer` subcommand.
#[derive(Args, Debug)]
pub struct ProducerArgs {
    /// Name of the task queue (not needed with --dry-run)
    #[arg(long, env = "ROLLUP_QUEUE_NAME", required_unless_present = "dry_run")]
    pub queue_name: Option<String>,

    /// Role assumed for every S3 call
    #[arg(long)]
    pub s3_role: String,

    /// Root prefixes to roll up, as s3://bucket/prefix
    #[arg(long, num_args = 1.., required = true)]
    pub prefixes: Vec<S3Uri>,

    /// Print tasks to stdout instead of queuing them
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, value_enum, default_value = "jsonl")]
    pub output_format: OutputFormatArg,

    /// Folder levels searched below each root
    #[arg(long, default_value = "3")]
    pub max_depth: usize,

    /// Prefixes interleaved at a time (must be >= 1)
    #[arg(long, default_value = "20", value_parser = parse_positive_usize)]
    pub window: usize,
}

/// Arguments of the `worker` subcommand.
#[derive(Args, Debug)]
pub struct WorkerArgs {
    /// Name of the task queue
    #[arg(long, env = "ROLLUP_QUEUE_NAME")]
    pub queue_name: String,

    /// Messages to handle before exiting (must be >= 1)
    #[arg(long, default_value = "1", value_parser = parse_positive_usize)]
    pub count: usize,

    /// Delete the source logs once their archive is uploaded
    #[arg(long)]
    pub delete: bool,

    /// Concurrent downloads per task (defaults to CPU count + 4, at most 32)
    #[arg(long, value_parser = parse_positive_usize)]
    pub download_concurrency: Option<usize>,

    /// Scratch directory for downloads (system temp dir if unset)
    #[arg(long, env = "ROLLUP_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// SQS long-poll wait time in seconds (0-20)
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(i32).range(0..=20))]
    pub wait_time: i32,
}

/// Arguments of the `event` subcommand.
#[derive(Args, Debug)]
pub struct EventArgs {
    /// Name of the task queue
    #[arg(long, env = "ROLLUP_QUEUE_NAME")]
    pub queue_name: String,

    /// Event file (stdin if unset)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// AWS connection options, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct AwsArgs {
    /// AWS region
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Custom AWS endpoint URL (for LocalStack)
    #[arg(long, env = "AWS_ENDPOINT_URL", global = true)]
    pub endpoint: Option<String>,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID", global = true, hide_env_values = true)]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", global = true, hide_env_values = true)]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE", global = true)]
    pub profile: Option<String>,
}

impl From<AwsArgs> for AwsConfig {
    fn from(args: AwsArgs) -> Self {
        let mut config = AwsConfig::new();
        if let Some(region) = args.region {
            config = config.with_region(region);
        }
        if let Some(endpoint) = args.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) = (args.access_key, args.secret_key) {
            config = config.with_credentials(access_key, secret_key);
        }
        if let Some(profile) = args.profile {
            config = config.with_profile(profile);
        }
        config
    }
}

/// Output format argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    /// JSON Lines (one JSON object per line)
    Jsonl,
    /// Pretty-printed JSON
    Json,
}

impl From<OutputFormatArg> for lr_producer::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Jsonl => lr_producer::OutputFormat::Jsonl,
            OutputFormatArg::Json => lr_producer::OutputFormat::Json,
        }
    }
}

/// Log level argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
