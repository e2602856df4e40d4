//! Main Producer implementation.

use futures::TryStreamExt;
use lr_error::{LrError, Result};
use lr_traits::{ObjectStore, RoleSession, SessionProvider};
use lr_types::{S3Uri, SEPARATOR};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::builder::TaskCursor;
use crate::config::ProducerConfig;
use crate::discover::find_log_prefixes;
use crate::output::Output;
use crate::path::PathNode;
use crate::scheduler::PrefixScheduler;
use crate::stats::ProducerStats;

/// Region reported for buckets without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Maps a bucket location constraint to a region name.
///
/// `us-east-1` buckets report no constraint and old `eu-west-1` buckets
/// report the legacy value `EU`.
pub fn normalize_region(location_constraint: &str) -> &str {
    match location_constraint {
        "" => DEFAULT_REGION,
        "EU" => "eu-west-1",
        other => other,
    }
}

/// Turns roots into queued rollup tasks.
///
/// For each root: assume the role, check the bucket region, discover log
/// prefixes, build each prefix's tasks and interleave them round-robin into
/// the output.
pub struct Producer<O: Output> {
    sessions: Arc<dyn SessionProvider>,
    output: O,
    config: ProducerConfig,
}

impl<O: Output> Producer<O> {
    /// Create a new Producer.
    pub fn new(sessions: Arc<dyn SessionProvider>, output: O, config: ProducerConfig) -> Self {
        Self {
            sessions,
            output,
            config,
        }
    }

    /// The output tasks are written to.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Produce the tasks of one root.
    ///
    /// Fails on the first error; tasks already output stay output.
    pub async fn produce(&self, role: &str, root: &S3Uri) -> Result<ProducerStats> {
        let mut stats = ProducerStats::new();
        self.produce_root(role, root, &mut stats).await?;
        self.output.flush().await?;
        stats.complete();
        Ok(stats)
    }

    /// Produce the tasks of every root in turn.
    ///
    /// A failing root is logged and recorded in the stats; the remaining
    /// roots are still processed.
    pub async fn run(&self, role: &str, roots: &[S3Uri]) -> ProducerStats {
        let mut stats = ProducerStats::new();

        for root in roots {
            if let Err(e) = self.produce_root(role, root, &mut stats).await {
                error!(root = %root, error = %e, "Failed to produce tasks");
                stats.record_error(format!("{root}: {e}"));
            }
        }

        if let Err(e) = self.output.flush().await {
            error!(error = %e, "Failed to flush output");
            stats.record_error(format!("Flush failed: {e}"));
        }

        stats.complete();
        stats
    }

    async fn produce_root(
        &self,
        role: &str,
        root: &S3Uri,
        stats: &mut ProducerStats,
    ) -> Result<()> {
        let session = self.sessions.assume(role).await?;
        check_region(&session, root.bucket()).await?;

        info!(root = %root, role, "Producing rollup tasks");

        if names_only_folders(session.store.as_ref(), root).await? {
            warn!(
                root = %root,
                "Root has no trailing '/' and only matches folders, so no logs will be \
                 found; add the trailing '/' to roll up the folder"
            );
        }

        let store = session.store.clone();
        let config = self.config.clone();
        let owner = role.to_string();
        let node = Arc::new(PathNode::from_uri(store.clone(), root));
        let cursors = find_log_prefixes(node, self.config.max_depth).map_ok(move |prefix| {
            info!(prefix = %prefix, "Start processing access log files");
            TaskCursor::new(store.clone(), owner.clone(), prefix, &config)
        });

        let mut scheduler = PrefixScheduler::new(cursors, self.config.window);
        let result = self.drain(&mut scheduler, stats).await;
        stats.record_prefixes(scheduler.admitted(), scheduler.finished());
        result?;

        info!(
            root = %root,
            prefixes = scheduler.finished(),
            "Done processing a total of {} prefixes",
            scheduler.finished()
        );
        stats.record_root();
        Ok(())
    }

    async fn drain(
        &self,
        scheduler: &mut PrefixScheduler<TaskCursor>,
        stats: &mut ProducerStats,
    ) -> Result<()> {
        while let Some(packed) = scheduler.next_task().await? {
            debug!(task = %packed.task, bytes = packed.bytes, "Scheduled task");
            self.output.output(&packed.task).await?;
            stats.record_task(packed.task.len(), packed.bytes);
        }
        Ok(())
    }
}

/// True for a file-like root such as `s3://bucket1/example.com` that matches
/// no object of its own directory but does match folders.
async fn names_only_folders(store: &dyn ObjectStore, root: &S3Uri) -> Result<bool> {
    let key = root.key();
    if key.is_empty() || key.ends_with(SEPARATOR) {
        return Ok(false);
    }

    let page = store.list_page(root.bucket(), key, Some("/"), None).await?;
    Ok(page.objects.is_empty() && !page.common_prefixes.is_empty())
}

/// Fails unless `bucket` lives in the session's region.
async fn check_region(session: &RoleSession, bucket: &str) -> Result<()> {
    let constraint = session.store.bucket_region(bucket).await?;
    let bucket_region = normalize_region(&constraint);

    if bucket_region != session.region {
        return Err(LrError::RegionMismatch {
            bucket: bucket.to_string(),
            bucket_region: bucket_region.to_string(),
            session_region: session.region.clone(),
        });
    }
    Ok(())
}
