//! lr-producer - Rollup task production for logroll.
//!
//! This crate turns buckets full of S3 server access logs into rollup tasks.
//! It provides:
//!
//! - A directory view over the flat key space with memoized, paginated
//!   listings ([`PathNode`])
//! - Discovery of every prefix that directly holds access logs
//! - Per-prefix task building: date grouping, today cutoff and size/count
//!   bin-packing ([`TaskCursor`])
//! - Round-robin scheduling over a bounded window of prefixes
//!   ([`PrefixScheduler`])
//! - Output to a message queue or to stdout
//!
//! # Example
//!
//! ```ignore
//! use lr_producer::{Producer, ProducerConfig, QueueOutput};
//! use lr_types::S3Uri;
//!
//! let output = QueueOutput::new(queue);
//! let producer = Producer::new(sessions, output, ProducerConfig::new());
//!
//! let root = S3Uri::parse("s3://bucket1/log/")?;
//! let stats = producer.produce("arn:aws:iam::123456789012:role/rollup", &root).await?;
//! eprintln!("Queued {} tasks", stats.tasks_queued);
//! ```

pub mod builder;
pub mod config;
pub mod discover;
pub mod filter;
pub mod list;
pub mod output;
pub mod path;
pub mod producer;
pub mod scheduler;
pub mod stats;

pub use builder::{Bin, BinPacker, PackedTask, TaskCursor, TaskStream, pack_bins, parent_dir};
pub use config::ProducerConfig;
pub use discover::find_log_prefixes;
pub use filter::{is_log_object, log_date};
pub use output::{Output, OutputFormat, QueueOutput, StdoutOutput};
pub use path::PathNode;
pub use producer::{Producer, normalize_region};
pub use scheduler::PrefixScheduler;
pub use stats::ProducerStats;
