//! Core data types for logroll.
//!
//! This crate provides:
//! - [`RollupTask`] - The unit of work and the queue message payload
//! - [`S3Uri`] - A parsed `s3://bucket/key` location
//! - [`ObjectSummary`] - Key and size of a listed object

mod object;
mod task;
mod uri;

pub use object::{ObjectSummary, basename};
pub use task::{MAX_DELETE_BATCH, MAX_MESSAGE_BASENAMES, RollupTask, TARBALL_PREFIX};
pub use uri::S3Uri;

/// Key separator used to emulate directories on top of the flat key space.
pub const SEPARATOR: char = '/';
