//! Fair interleaving of many per-prefix task streams.
//!
//! S3 rate limits requests per prefix. Draining prefixes one after another
//! would send every worker to the same prefix at once, while opening every
//! prefix up front holds one listing state per prefix in memory. The
//! scheduler keeps a bounded window of open cursors and takes one task from
//! each in turn.

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use lr_error::Result;
use std::collections::VecDeque;
use tracing::debug;

use crate::builder::{PackedTask, TaskStream};

/// Round-robin scheduler over a window of task cursors.
pub struct PrefixScheduler<C> {
    pending: Option<BoxStream<'static, Result<C>>>,
    active: VecDeque<C>,
    window: usize,
    admitted: usize,
    finished: usize,
}

impl<C: TaskStream + 'static> PrefixScheduler<C> {
    /// Create a scheduler admitting cursors from `cursors`, at most `window`
    /// at a time.
    pub fn new(cursors: impl Stream<Item = Result<C>> + Send + 'static, window: usize) -> Self {
        Self {
            pending: Some(cursors.boxed()),
            active: VecDeque::new(),
            window: window.max(1),
            admitted: 0,
            finished: 0,
        }
    }

    /// Number of cursors admitted into the window so far.
    pub fn admitted(&self) -> usize {
        self.admitted
    }

    /// Number of cursors run to exhaustion so far.
    pub fn finished(&self) -> usize {
        self.finished
    }

    /// Number of cursors currently open.
    pub fn active(&self) -> usize {
        self.active.len()
    }

    /// The next task, or `None` once every cursor is exhausted.
    ///
    /// The cursor at the front of the window supplies the task and moves to
    /// the back. An exhausted cursor is dropped and its slot goes to the next
    /// pending prefix.
    pub async fn next_task(&mut self) -> Result<Option<PackedTask>> {
        loop {
            self.fill_window().await?;

            let Some(mut cursor) = self.active.pop_front() else {
                return Ok(None);
            };

            match cursor.next_task().await? {
                Some(packed) => {
                    self.active.push_back(cursor);
                    return Ok(Some(packed));
                }
                None => {
                    self.finished += 1;
                    debug!(
                        finished = self.finished,
                        active = self.active.len(),
                        "Prefix exhausted"
                    );
                }
            }
        }
    }

    /// Turn the scheduler into a stream of tasks.
    pub fn into_stream(self) -> impl Stream<Item = Result<PackedTask>> + Send + 'static {
        futures::stream::try_unfold(self, |mut scheduler| async move {
            let next = scheduler.next_task().await?;
            Ok(next.map(|packed| (packed, scheduler)))
        })
    }

    async fn fill_window(&mut self) -> Result<()> {
        while self.active.len() < self.window {
            let Some(pending) = self.pending.as_mut() else {
                break;
            };

            match pending.next().await {
                Some(cursor) => {
                    self.active.push_back(cursor?);
                    self.admitted += 1;
                }
                None => self.pending = None,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use lr_error::LrError;
    use lr_types::RollupTask;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeCursor {
        tasks: VecDeque<PackedTask>,
    }

    impl FakeCursor {
        fn new(prefix: &str, count: usize) -> Self {
            let tasks = (0..count)
                .map(|i| PackedTask {
                    task: RollupTask::new(
                        "role",
                        "bucket1",
                        prefix,
                        vec![format!("2022-06-{:02}-00-00-00-AAAA", i + 1)],
                    ),
                    bytes: 1,
                })
                .collect();
            Self { tasks }
        }
    }

    #[async_trait]
    impl TaskStream for FakeCursor {
        async fn next_task(&mut self) -> Result<Option<PackedTask>> {
            Ok(self.tasks.pop_front())
        }
    }

    fn cursors(counts: &[usize]) -> impl Stream<Item = Result<FakeCursor>> + Send + 'static {
        let cursors: Vec<Result<FakeCursor>> = counts
            .iter()
            .enumerate()
            .map(|(i, count)| Ok(FakeCursor::new(&format!("p{i}/"), *count)))
            .collect();
        futures::stream::iter(cursors)
    }

    fn prefixes(tasks: &[PackedTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.task.common_prefix.as_str()).collect()
    }

    #[tokio::test]
    async fn test_round_robin() {
        let scheduler = PrefixScheduler::new(cursors(&[3, 1, 2]), 20);

        let tasks: Vec<PackedTask> = scheduler.into_stream().try_collect().await.unwrap();

        assert_eq!(prefixes(&tasks), vec!["p0/", "p1/", "p2/", "p0/", "p2/", "p0/"]);
    }

    #[tokio::test]
    async fn test_first_tasks_come_from_distinct_prefixes() {
        let scheduler = PrefixScheduler::new(cursors(&[5, 5, 5, 5]), 4);

        let tasks: Vec<PackedTask> = scheduler.into_stream().try_collect().await.unwrap();

        assert_eq!(tasks.len(), 20);
        let mut first = prefixes(&tasks[..4]);
        first.sort();
        first.dedup();
        assert_eq!(first.len(), 4);
    }

    #[tokio::test]
    async fn test_window_admits_next_prefix_when_one_is_exhausted() {
        let mut scheduler = PrefixScheduler::new(cursors(&[1, 3, 2]), 2);
        let mut order = Vec::new();

        while let Some(packed) = scheduler.next_task().await.unwrap() {
            assert!(scheduler.active() <= 2);
            order.push(packed.task.common_prefix);
        }

        // p2 is only admitted once p0 is exhausted.
        assert_eq!(order, vec!["p0/", "p1/", "p1/", "p2/", "p1/", "p2/"]);
        assert_eq!(scheduler.admitted(), 3);
        assert_eq!(scheduler.finished(), 3);
    }

    #[tokio::test]
    async fn test_cursors_are_pulled_lazily() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let stream = futures::stream::iter(0..100).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(FakeCursor::new(&format!("p{i}/"), 1))
        });
        let mut scheduler = PrefixScheduler::new(stream, 3);

        scheduler.next_task().await.unwrap();

        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let mut scheduler = PrefixScheduler::new(cursors(&[]), 20);

        assert!(scheduler.next_task().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cursor_error_is_propagated() {
        let stream = futures::stream::iter(vec![
            Ok(FakeCursor::new("p0/", 1)),
            Err(LrError::Config("listing failed".to_string())),
        ]);
        let scheduler = PrefixScheduler::new(stream, 20);

        let result: Result<Vec<PackedTask>> = scheduler.into_stream().try_collect().await;

        assert!(result.is_err());
    }
}
