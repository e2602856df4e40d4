//! Log prefix discovery.

use async_stream::try_stream;
use futures::{Stream, StreamExt, pin_mut};
use lr_error::Result;
use lr_types::S3Uri;
use std::sync::Arc;
use tracing::debug;

use crate::filter::is_log_object;
use crate::path::PathNode;

/// Finds every prefix below `root` that directly holds access logs.
///
/// A file-like root (for example `s3://bucket1/example.com/2022-`) is a
/// literal key prefix and is yielded unchanged without any listing. A
/// directory root is yielded when one of its own files is a log object, then
/// every folder down to `max_depth` is checked the same way. A folder whose
/// logs all live in sub-folders is not yielded itself.
pub fn find_log_prefixes(
    root: Arc<PathNode>,
    max_depth: usize,
) -> impl Stream<Item = Result<S3Uri>> + Send + 'static {
    try_stream! {
        if root.is_file() {
            debug!(prefix = %root, "Using literal key prefix");
            yield root.uri();
        } else {
            if has_log_files(&root).await? {
                yield root.uri();
            }

            let folders = root.clone().find_folders(max_depth);
            pin_mut!(folders);

            while let Some(folder) = folders.next().await {
                let folder = folder?;
                if has_log_files(&folder).await? {
                    yield folder.uri();
                }
            }
        }
    }
}

async fn has_log_files(node: &PathNode) -> Result<bool> {
    let files = node.files().await?;
    Ok(files.iter().any(|file| is_log_object(file.name())))
}
