//! Task archiving.
//!
//! [`ArchivePipeline`] turns one rollup task into one archive object:
//! concurrent download into a scratch directory, a gzip-compressed tarball
//! with members in name order, upload, then optional deletion of the sources.

mod archive;
mod tarball;

pub use archive::{ArchiveOutcome, ArchivePipeline, METADATA_FILE_COUNT, METADATA_FILE_SIZE};
pub use tarball::{build_tarball, build_tarball_blocking};
