//! Object store trait and listing types.

use async_trait::async_trait;
use lr_error::Result;
use lr_types::ObjectSummary;
use std::collections::HashMap;
use std::path::Path;

/// Trait for object store backends.
///
/// Implementations include:
/// - In-memory store (for testing/development)
/// - AWS S3 (production)
///
/// Listings must return keys in ascending order, the way S3 `ListObjectsV2`
/// does; task grouping relies on it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists one page of keys under `prefix`.
    ///
    /// With a `delimiter`, keys containing the delimiter after the prefix are
    /// rolled up into `common_prefixes`. Pass the previous page's
    /// `next_continuation` to fetch the following page.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage>;

    /// Downloads an object to a local file, returning the bytes written.
    async fn get_object_to_file(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64>;

    /// Uploads a local file with user metadata.
    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &HashMap<String, String>,
    ) -> Result<()>;

    /// Deletes up to 1000 keys in one request.
    ///
    /// Keys that do not exist count as deleted.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteReport>;

    /// Returns the region the bucket lives in.
    async fn bucket_region(&self, bucket: &str) -> Result<String>;

    /// Lists every page under `prefix`, following continuation tokens.
    async fn list(&self, bucket: &str, prefix: &str, delimiter: Option<&str>) -> Result<Listing> {
        let mut listing = Listing::default();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .list_page(bucket, prefix, delimiter, continuation.as_deref())
                .await?;

            listing.common_prefixes.extend(page.common_prefixes);
            listing.objects.extend(page.objects);

            match page.next_continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(listing)
    }
}

/// One page of a listing call.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Directory-like prefixes (ending with the delimiter)
    pub common_prefixes: Vec<String>,

    /// Objects directly matched by the listing
    pub objects: Vec<ObjectSummary>,

    /// Token for the next page, if the listing was truncated
    pub next_continuation: Option<String>,
}

/// A complete, multi-page listing.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Directory-like prefixes (ending with the delimiter)
    pub common_prefixes: Vec<String>,

    /// Objects directly matched by the listing
    pub objects: Vec<ObjectSummary>,
}

/// Outcome of a batch delete.
#[derive(Debug, Clone, Default)]
pub struct DeleteReport {
    /// Keys acknowledged as deleted (including ones already absent)
    pub deleted: Vec<String>,

    /// Keys the store refused to delete
    pub failed: Vec<DeleteFailure>,
}

/// A key that could not be deleted.
#[derive(Debug, Clone)]
pub struct DeleteFailure {
    /// The object key
    pub key: String,

    /// Error code and message reported by the store
    pub reason: String,
}
