//! S3-backed object store.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use lr_error::{Result, StoreError};
use lr_traits::{DeleteFailure, DeleteReport, ListPage, ObjectStore};
use lr_types::ObjectSummary;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

/// Object store over an S3 client.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Wrap an S3 client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_delimiter(delimiter.map(String::from))
            .set_continuation_token(continuation.map(String::from))
            .send()
            .await
            .map_err(|e| {
                StoreError::List(format!(
                    "Failed to list s3://{bucket}/{prefix}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key()
                    .map(|key| ObjectSummary::new(key, obj.size().unwrap_or(0).max(0) as u64))
            })
            .collect();

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(String::from))
            .collect();

        let next_continuation = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(String::from)
        } else {
            None
        };

        trace!(
            bucket,
            prefix,
            truncated = next_continuation.is_some(),
            "Listed page"
        );

        Ok(ListPage {
            common_prefixes,
            objects,
            next_continuation,
        })
    }

    async fn get_object_to_file(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StoreError::NotFound(format!("s3://{bucket}/{key}"))
                } else {
                    StoreError::Get {
                        key: key.to_string(),
                        reason: DisplayErrorContext(&e).to_string(),
                    }
                }
            })?;

        let mut body = response.body;
        let mut file = tokio::fs::File::create(local_path).await?;
        let mut bytes = 0u64;
        while let Some(chunk) = body.try_next().await.map_err(|e| StoreError::Get {
            key: key.to_string(),
            reason: format!("Failed to read body: {e}"),
        })? {
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bucket, key, bytes, "Downloaded object");
        Ok(bytes)
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &HashMap<String, String>,
    ) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StoreError::Put {
                key: key.to_string(),
                reason: format!("Failed to open {}: {e}", local_path.display()),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .set_metadata(Some(metadata.clone()))
            .send()
            .await
            .map_err(|e| StoreError::Put {
                key: key.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(bucket, key, "Uploaded object");
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteReport> {
        if keys.is_empty() {
            return Ok(DeleteReport::default());
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Delete(format!("Invalid delete request: {e}")))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| StoreError::Delete(format!("Invalid delete request: {e}")))?;

        let response = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                StoreError::Delete(format!(
                    "Failed to delete {} objects from {bucket}: {}",
                    keys.len(),
                    DisplayErrorContext(&e)
                ))
            })?;

        // Quiet mode only reports the keys that failed.
        let failed: Vec<DeleteFailure> = response
            .errors()
            .iter()
            .map(|err| DeleteFailure {
                key: err.key().unwrap_or_default().to_string(),
                reason: format!(
                    "{}: {}",
                    err.code().unwrap_or("Unknown"),
                    err.message().unwrap_or_default()
                ),
            })
            .collect();
        let failed_keys: HashSet<&str> = failed.iter().map(|f| f.key.as_str()).collect();
        let deleted = keys
            .iter()
            .filter(|key| !failed_keys.contains(key.as_str()))
            .cloned()
            .collect();

        Ok(DeleteReport { deleted, failed })
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String> {
        let response = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                StoreError::Location(format!(
                    "Failed to locate bucket {bucket}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(response
            .location_constraint()
            .map(|c| c.as_str().to_string())
            .unwrap_or_default())
    }
}
