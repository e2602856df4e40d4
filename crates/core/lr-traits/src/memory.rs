//! In-memory implementations of the collaborator traits.
//!
//! These follow the observable behavior of S3 and SQS closely enough for the
//! producer and worker to be exercised end to end without AWS: sorted
//! listings with delimiter rollup and pagination, idempotent deletes, and
//! at-least-once delivery with redelivery of unacknowledged messages.

use async_trait::async_trait;
use lr_error::{LrError, QueueError, Result, StoreError};
use lr_types::ObjectSummary;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    DeleteFailure, DeleteReport, ListPage, MessageQueue, ObjectStore, RawMessage, RoleSession,
    SessionProvider,
};

/// Largest page returned by one listing call, as in S3.
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Default)]
struct StoredObject {
    data: Vec<u8>,
    metadata: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct Bucket {
    region: String,
    objects: BTreeMap<String, StoredObject>,
}

/// In-memory object store.
#[derive(Debug)]
pub struct MemoryObjectStore {
    buckets: Mutex<BTreeMap<String, Bucket>>,
    page_size: usize,
    failing_gets: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    delete_batches: Mutex<Vec<usize>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            failing_gets: Mutex::new(HashSet::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            delete_batches: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// Set the maximum number of entries per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create a bucket located in `region`.
    pub fn create_bucket(&self, bucket: &str, region: &str) {
        let mut buckets = self.buckets.lock();
        let entry = buckets.entry(bucket.to_string()).or_default();
        entry.region = region.to_string();
    }

    /// Store an object, creating the bucket if needed.
    pub fn put(&self, bucket: &str, key: &str, data: &[u8]) {
        let mut buckets = self.buckets.lock();
        buckets.entry(bucket.to_string()).or_default().objects.insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                metadata: HashMap::new(),
            },
        );
    }

    /// Contents of an object, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets
            .lock()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.data.clone())
    }

    /// User metadata of an object, if present.
    pub fn metadata(&self, bucket: &str, key: &str) -> Option<HashMap<String, String>> {
        self.buckets
            .lock()
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|o| o.metadata.clone())
    }

    /// All keys of a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every download of `key` fail.
    pub fn fail_get(&self, key: &str) {
        self.failing_gets.lock().insert(key.to_string());
    }

    /// Make the store refuse to delete `key`.
    pub fn fail_delete(&self, key: &str) {
        self.failing_deletes.lock().insert(key.to_string());
    }

    /// Number of `list_page` calls served.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Number of `get_object_to_file` calls served.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }

    /// Key counts of every `delete_objects` call, in call order.
    pub fn delete_batches(&self) -> Vec<usize> {
        self.delete_batches.lock().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        let buckets = self.buckets.lock();
        let stored = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::List(format!("NoSuchBucket: {bucket}")))?;

        let mut page = ListPage::default();
        let mut entries = 0;
        let mut last_name: Option<String> = None;

        for (key, object) in stored.objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }

            let rest = &key[prefix.len()..];
            let rolled_up = delimiter.filter(|d| !d.is_empty()).and_then(|d| {
                rest.find(d)
                    .map(|idx| format!("{prefix}{}", &rest[..idx + d.len()]))
            });
            let name = rolled_up.clone().unwrap_or_else(|| key.clone());

            if continuation.is_some_and(|token| name.as_str() <= token) {
                continue;
            }
            if last_name.as_deref() == Some(name.as_str()) {
                continue;
            }

            if entries == self.page_size {
                page.next_continuation = last_name;
                return Ok(page);
            }

            match rolled_up {
                Some(common_prefix) => page.common_prefixes.push(common_prefix),
                None => page
                    .objects
                    .push(ObjectSummary::new(key.clone(), object.data.len() as u64)),
            }
            entries += 1;
            last_name = Some(name);
        }

        Ok(page)
    }

    async fn get_object_to_file(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);

        if self.failing_gets.lock().contains(key) {
            return Err(StoreError::Get {
                key: key.to_string(),
                reason: "InternalError: injected failure".to_string(),
            }
            .into());
        }

        let data = self
            .object(bucket, key)
            .ok_or_else(|| StoreError::NotFound(format!("s3://{bucket}/{key}")))?;

        tokio::fs::write(local_path, &data).await?;
        Ok(data.len() as u64)
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        metadata: &HashMap<String, String>,
    ) -> Result<()> {
        let data = tokio::fs::read(local_path).await?;

        let mut buckets = self.buckets.lock();
        let stored = buckets.get_mut(bucket).ok_or_else(|| StoreError::Put {
            key: key.to_string(),
            reason: format!("NoSuchBucket: {bucket}"),
        })?;
        stored.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteReport> {
        self.delete_batches.lock().push(keys.len());

        let failing = self.failing_deletes.lock().clone();
        let mut buckets = self.buckets.lock();
        let stored = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::Delete(format!("NoSuchBucket: {bucket}")))?;

        let mut report = DeleteReport::default();
        for key in keys {
            if failing.contains(key) {
                report.failed.push(DeleteFailure {
                    key: key.clone(),
                    reason: "AccessDenied: injected failure".to_string(),
                });
            } else {
                stored.objects.remove(key);
                report.deleted.push(key.clone());
            }
        }
        Ok(report)
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|b| b.region.clone())
            .ok_or_else(|| StoreError::Location(format!("NoSuchBucket: {bucket}")).into())
    }
}

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<String>,
    in_flight: HashMap<String, String>,
    next_handle: u64,
}

/// In-memory message queue with SQS-like delivery.
///
/// Received messages stay in flight until deleted. [`expire_in_flight`]
/// stands in for the visibility timeout and makes them visible again.
///
/// [`expire_in_flight`]: MemoryQueue::expire_in_flight
#[derive(Debug, Default)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    sent: AtomicUsize,
}

impl MemoryQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every in-flight message to the queue.
    pub fn expire_in_flight(&self) {
        let mut state = self.state.lock();
        let mut expired: Vec<(String, String)> = state.in_flight.drain().collect();
        expired.sort();
        state.visible.extend(expired.into_iter().map(|(_, body)| body));
    }

    /// Bodies of visible messages, in delivery order.
    pub fn visible_bodies(&self) -> Vec<String> {
        self.state.lock().visible.iter().cloned().collect()
    }

    /// Number of visible messages.
    pub fn visible_len(&self) -> usize {
        self.state.lock().visible.len()
    }

    /// Number of received but unacknowledged messages.
    pub fn in_flight_len(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Total number of messages ever sent.
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send(&self, body: &str) -> Result<()> {
        self.state.lock().visible.push_back(body.to_string());
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<RawMessage>> {
        let mut state = self.state.lock();
        let mut messages = Vec::new();

        while messages.len() < max {
            let Some(body) = state.visible.pop_front() else {
                break;
            };
            state.next_handle += 1;
            let receipt_handle = format!("rh-{:08}", state.next_handle);
            state.in_flight.insert(receipt_handle.clone(), body.clone());
            messages.push(RawMessage {
                body,
                receipt_handle,
            });
        }

        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.state
            .lock()
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| {
                QueueError::Delete(format!("ReceiptHandleIsInvalid: {receipt_handle}")).into()
            })
    }
}

/// Session provider handing out one shared in-memory store.
#[derive(Debug)]
pub struct MemorySessions {
    store: Arc<MemoryObjectStore>,
    region: String,
    denied: Mutex<HashSet<String>>,
    assumed: Mutex<Vec<String>>,
}

impl MemorySessions {
    /// Sessions over `store`, all operating in `region`.
    pub fn new(store: Arc<MemoryObjectStore>, region: impl Into<String>) -> Self {
        Self {
            store,
            region: region.into(),
            denied: Mutex::new(HashSet::new()),
            assumed: Mutex::new(Vec::new()),
        }
    }

    /// Make assuming `role` fail.
    pub fn deny(&self, role: &str) {
        self.denied.lock().insert(role.to_string());
    }

    /// Roles assumed so far, in call order.
    pub fn assumed_roles(&self) -> Vec<String> {
        self.assumed.lock().clone()
    }
}

#[async_trait]
impl SessionProvider for MemorySessions {
    async fn assume(&self, role: &str) -> Result<RoleSession> {
        if self.denied.lock().contains(role) {
            return Err(LrError::Store(StoreError::Credentials(format!(
                "AccessDenied: not authorized to assume {role}"
            ))));
        }

        self.assumed.lock().push(role.to_string());
        Ok(RoleSession {
            role: role.to_string(),
            region: self.region.clone(),
            store: self.store.clone(),
        })
    }
}
