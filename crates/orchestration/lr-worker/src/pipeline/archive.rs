//! Download, archive, upload and delete for one rollup task.

use futures::{StreamExt, TryStreamExt};
use lr_error::{LrError, Result};
use lr_traits::{ObjectStore, SessionProvider};
use lr_types::{MAX_DELETE_BATCH, RollupTask};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::tarball::build_tarball_blocking;
use crate::config::WorkerConfig;

/// Archive metadata key holding the number of archived objects.
pub const METADATA_FILE_COUNT: &str = "OriginalFileCount";

/// Archive metadata key holding the total size of the archived objects.
pub const METADATA_FILE_SIZE: &str = "OriginalFileSize";

/// Result of archiving one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Key the archive was uploaded to
    pub tarball_key: String,

    /// Objects in the archive
    pub file_count: usize,

    /// Total size of the downloaded objects
    pub bytes_downloaded: u64,

    /// Size of the uploaded archive
    pub archive_bytes: u64,

    /// Source objects deleted
    pub deleted: usize,

    /// Source objects the store refused to delete
    pub delete_failures: usize,
}

/// Archives rollup tasks.
pub struct ArchivePipeline {
    sessions: Arc<dyn SessionProvider>,
    download_concurrency: usize,
    work_dir: Option<PathBuf>,
}

impl ArchivePipeline {
    /// Create a pipeline assuming task roles through `sessions`.
    pub fn new(sessions: Arc<dyn SessionProvider>, config: &WorkerConfig) -> Self {
        Self {
            sessions,
            download_concurrency: config.download_concurrency.max(1),
            work_dir: config.work_dir.clone(),
        }
    }

    /// Roll `task` up into one archive next to its objects.
    ///
    /// Any failed download fails the whole task before anything is uploaded.
    /// Sources are deleted only after the upload succeeded; per-key delete
    /// failures are logged and counted without failing the task.
    pub async fn process(
        &self,
        task: &RollupTask,
        delete_sources: bool,
    ) -> Result<ArchiveOutcome> {
        task.validate()?;
        let date_str = task.date_str()?;
        let tarball_key = task.tarball_key()?;

        let session = self.sessions.assume(&task.role).await?;
        let store = session.store;

        let scratch = self.scratch_dir()?;
        debug!(task = %task, dir = %scratch.path().display(), "Downloading task objects");

        let (files, bytes_downloaded) = self.download(&store, task, &scratch).await?;

        let archive_path = scratch.path().join(format!("{date_str}.tgz"));
        let archive_bytes = build_tarball_blocking(files, archive_path.clone()).await?;

        info!(
            task = %task,
            key = %tarball_key,
            archive_bytes,
            "Uploading archive to s3://{}/{}",
            task.bucket,
            tarball_key
        );
        let metadata = HashMap::from([
            (METADATA_FILE_COUNT.to_string(), task.len().to_string()),
            (METADATA_FILE_SIZE.to_string(), bytes_downloaded.to_string()),
        ]);
        store
            .put_object_from_file(&task.bucket, &tarball_key, &archive_path, &metadata)
            .await?;
        scratch.close()?;

        let mut outcome = ArchiveOutcome {
            tarball_key,
            file_count: task.len(),
            bytes_downloaded,
            archive_bytes,
            deleted: 0,
            delete_failures: 0,
        };

        if delete_sources {
            self.delete_sources(&store, task, &mut outcome).await?;
        }

        Ok(outcome)
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("logroll-");
        let dir = match &self.work_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Download every object of `task` into `scratch`.
    ///
    /// Returns the local paths sorted by name and the total bytes downloaded.
    async fn download(
        &self,
        store: &Arc<dyn ObjectStore>,
        task: &RollupTask,
        scratch: &TempDir,
    ) -> Result<(Vec<PathBuf>, u64)> {
        let downloads = task.basenames.iter().map(|basename| {
            let store = store.clone();
            let bucket = task.bucket.clone();
            let key = format!("{}{}", task.common_prefix, basename);
            let local = scratch.path().join(basename);
            async move {
                let bytes = store.get_object_to_file(&bucket, &key, &local).await?;
                debug!(key = %key, bytes, "Downloaded object");
                Ok::<_, LrError>((local, bytes))
            }
        });

        let mut downloaded: Vec<(PathBuf, u64)> = futures::stream::iter(downloads)
            .buffer_unordered(self.download_concurrency)
            .try_collect()
            .await?;

        downloaded.sort_by(|a, b| a.0.cmp(&b.0));
        let total: u64 = downloaded.iter().map(|(_, bytes)| bytes).sum();
        let files: Vec<PathBuf> = downloaded.into_iter().map(|(path, _)| path).collect();
        Ok((files, total))
    }

    async fn delete_sources(
        &self,
        store: &Arc<dyn ObjectStore>,
        task: &RollupTask,
        outcome: &mut ArchiveOutcome,
    ) -> Result<()> {
        for chunk in task.split(MAX_DELETE_BATCH) {
            let report = store.delete_objects(&task.bucket, &chunk.object_keys()).await?;

            for failure in &report.failed {
                warn!(
                    key = %failure.key,
                    reason = %failure.reason,
                    "Failed to delete archived source object"
                );
            }
            outcome.deleted += report.deleted.len();
            outcome.delete_failures += report.failed.len();
        }

        info!(
            task = %task,
            deleted = outcome.deleted,
            failed = outcome.delete_failures,
            "Deleted archived source objects"
        );
        Ok(())
    }
}
