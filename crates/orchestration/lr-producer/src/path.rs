//! Directory view over a flat object key space.

use async_stream::try_stream;
use futures::Stream;
use lr_error::{LrError, Result};
use lr_traits::{Listing, ObjectStore};
use lr_types::{S3Uri, SEPARATOR};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

const DELIMITER: &str = "/";

/// A location in a bucket, seen as a directory or a file.
///
/// A node is a directory when its key is empty (bucket root) or ends with the
/// separator. Directory nodes list their direct children at most once: the
/// first call to [`folders`](PathNode::folders) or [`files`](PathNode::files)
/// fetches every page of the delimiter listing and keeps it for the lifetime
/// of the node.
pub struct PathNode {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
    listing: OnceCell<Listing>,
}

impl PathNode {
    /// Create a node for `bucket`/`key`.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
            listing: OnceCell::new(),
        }
    }

    /// Create a node for a parsed URI.
    pub fn from_uri(store: Arc<dyn ObjectStore>, uri: &S3Uri) -> Self {
        Self::new(store, uri.bucket(), uri.key())
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key within the bucket.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The node's location as a URI.
    pub fn uri(&self) -> S3Uri {
        S3Uri::from_segments(&self.bucket, &self.key)
    }

    /// The last path component, without a trailing separator.
    pub fn name(&self) -> &str {
        lr_types::basename(self.key.trim_end_matches(SEPARATOR))
    }

    pub fn is_dir(&self) -> bool {
        self.key.is_empty() || self.key.ends_with(SEPARATOR)
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// Number of separators in the key, ignoring a trailing one.
    ///
    /// The bucket root and top-level entries have depth 0.
    pub fn depth(&self) -> usize {
        self.key
            .trim_end_matches(SEPARATOR)
            .matches(SEPARATOR)
            .count()
    }

    /// Direct sub-directories of this node, in listing order.
    pub async fn folders(&self) -> Result<Vec<PathNode>> {
        let listing = self.listing().await?;
        Ok(listing
            .common_prefixes
            .iter()
            .map(|prefix| self.child(prefix))
            .collect())
    }

    /// Direct files of this node, in listing order.
    pub async fn files(&self) -> Result<Vec<PathNode>> {
        let listing = self.listing().await?;
        Ok(listing
            .objects
            .iter()
            .map(|object| self.child(&object.key))
            .collect())
    }

    /// Every descendant directory down to `max_depth`, depth first.
    ///
    /// A folder whose own depth reaches `max_depth` is yielded but its
    /// children are not listed. Each folder is yielded before its children
    /// are fetched, so reading its files right away reuses the listing.
    pub fn find_folders(
        self: Arc<Self>,
        max_depth: usize,
    ) -> impl Stream<Item = Result<Arc<PathNode>>> + Send + 'static {
        try_stream! {
            // Reversed children on a stack give pre-order traversal.
            let mut pending: Vec<Arc<PathNode>> = Vec::new();
            push_reversed(&mut pending, self.folders().await?);

            while let Some(folder) = pending.pop() {
                yield folder.clone();

                if folder.depth() < max_depth {
                    push_reversed(&mut pending, folder.folders().await?);
                }
            }
        }
    }

    async fn listing(&self) -> Result<&Listing> {
        if self.is_file() {
            return Err(LrError::NotADirectory(self.uri().to_string()));
        }

        self.listing
            .get_or_try_init(|| async {
                debug!(bucket = %self.bucket, prefix = %self.key, "Listing directory");
                self.store
                    .list(&self.bucket, &self.key, Some(DELIMITER))
                    .await
            })
            .await
    }

    fn child(&self, key: &str) -> PathNode {
        PathNode::new(self.store.clone(), &self.bucket, key)
    }
}

fn push_reversed(stack: &mut Vec<Arc<PathNode>>, nodes: Vec<PathNode>) {
    stack.extend(nodes.into_iter().rev().map(Arc::new));
}

impl fmt::Debug for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathNode")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("listed", &self.listing.initialized())
            .finish()
    }
}

impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
