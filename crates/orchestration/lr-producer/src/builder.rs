//! Per-prefix task building: date grouping and bin-packing.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use futures::stream::BoxStream;
use lr_error::Result;
use lr_traits::ObjectStore;
use lr_types::{ObjectSummary, RollupTask, S3Uri, SEPARATOR};
use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ProducerConfig;
use crate::filter::{is_log_object, log_date};
use crate::list::list_objects;

/// A closed bin: consecutive objects and their total size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bin {
    pub objects: Vec<ObjectSummary>,
    pub bytes: u64,
}

/// Sequential size- and count-bounded bin packer.
///
/// Objects keep their order. A bin is closed as soon as the next object would
/// push it over either bound; an object larger than `max_bytes` still gets a
/// bin of its own.
#[derive(Debug)]
pub struct BinPacker {
    max_bytes: u64,
    max_items: usize,
    current: Bin,
}

impl BinPacker {
    pub fn new(max_bytes: u64, max_items: usize) -> Self {
        Self {
            max_bytes,
            max_items: max_items.max(1),
            current: Bin::default(),
        }
    }

    /// Adds an object, returning the bin it closed, if any.
    pub fn push(&mut self, object: ObjectSummary) -> Option<Bin> {
        let fits = self.current.bytes.saturating_add(object.size) <= self.max_bytes
            && self.current.objects.len() < self.max_items;

        let closed = if self.current.objects.is_empty() || fits {
            None
        } else {
            Some(mem::take(&mut self.current))
        };

        self.current.bytes = self.current.bytes.saturating_add(object.size);
        self.current.objects.push(object);
        closed
    }

    /// Closes the open bin, if it holds anything.
    pub fn finish(&mut self) -> Option<Bin> {
        if self.current.objects.is_empty() {
            None
        } else {
            Some(mem::take(&mut self.current))
        }
    }
}

/// Packs `objects` into bins, in order.
pub fn pack_bins(
    objects: impl IntoIterator<Item = ObjectSummary>,
    max_bytes: u64,
    max_items: usize,
) -> Vec<Bin> {
    let mut packer = BinPacker::new(max_bytes, max_items);
    let mut bins: Vec<Bin> = objects.into_iter().filter_map(|o| packer.push(o)).collect();
    bins.extend(packer.finish());
    bins
}

/// A task together with the total size of its objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTask {
    pub task: RollupTask,
    pub bytes: u64,
}

/// A resumable sequence of tasks for one prefix.
#[async_trait]
pub trait TaskStream: Send {
    /// The next task, or `None` once the prefix is exhausted.
    async fn next_task(&mut self) -> Result<Option<PackedTask>>;
}

/// Parent directory of a key: everything up to and including the last
/// separator, or the bucket root when there is none.
pub fn parent_dir(key: &str) -> &str {
    match key.rfind(SEPARATOR) {
        Some(idx) => &key[..=idx],
        None => "",
    }
}

/// Builds the tasks of one log prefix, one listing page at a time.
///
/// Objects are grouped by the date at the start of their name. Enumeration
/// stops at the first object dated today or later: listings are sorted, so
/// nothing older can follow it.
pub struct TaskCursor {
    prefix: S3Uri,
    role: String,
    common_prefix: String,
    objects: Option<BoxStream<'static, Result<ObjectSummary>>>,
    today: NaiveDate,
    date: Option<NaiveDate>,
    packer: BinPacker,
    ready: VecDeque<PackedTask>,
}

impl TaskCursor {
    /// Open a cursor over `prefix`, acting as `role`.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        role: impl Into<String>,
        prefix: S3Uri,
        config: &ProducerConfig,
    ) -> Self {
        let objects = list_objects(store, prefix.bucket().to_string(), prefix.key().to_string());

        Self {
            common_prefix: parent_dir(prefix.key()).to_string(),
            role: role.into(),
            objects: Some(objects.boxed()),
            today: config.today(),
            date: None,
            packer: BinPacker::new(config.max_task_bytes, config.max_task_items),
            ready: VecDeque::new(),
            prefix,
        }
    }

    /// The prefix this cursor scans.
    pub fn prefix(&self) -> &S3Uri {
        &self.prefix
    }

    fn close_bin(&mut self) {
        if let Some(bin) = self.packer.finish() {
            self.enqueue(bin);
        }
    }

    fn enqueue(&mut self, bin: Bin) {
        let basenames = bin
            .objects
            .iter()
            .map(|o| o.basename().to_string())
            .collect();
        let task = RollupTask::new(
            &self.role,
            self.prefix.bucket(),
            &self.common_prefix,
            basenames,
        );
        self.ready.push_back(PackedTask {
            task,
            bytes: bin.bytes,
        });
    }

    fn finish(&mut self) {
        self.close_bin();
        if self.objects.take().is_some() {
            info!(prefix = %self.prefix, "Done processing access log files");
        }
    }
}

#[async_trait]
impl TaskStream for TaskCursor {
    async fn next_task(&mut self) -> Result<Option<PackedTask>> {
        loop {
            if let Some(packed) = self.ready.pop_front() {
                return Ok(Some(packed));
            }

            let Some(objects) = self.objects.as_mut() else {
                return Ok(None);
            };

            let Some(object) = objects.next().await else {
                self.finish();
                continue;
            };
            let object = object?;

            if !is_log_object(object.basename()) {
                continue;
            }
            let Some(date) = log_date(object.basename()) else {
                continue;
            };

            if date >= self.today {
                debug!(prefix = %self.prefix, key = %object.key, "Reached today's logs");
                self.finish();
                continue;
            }

            if self.date != Some(date) {
                self.close_bin();
                self.date = Some(date);
            }

            if let Some(bin) = self.packer.push(object) {
                self.enqueue(bin);
            }
        }
    }
}
