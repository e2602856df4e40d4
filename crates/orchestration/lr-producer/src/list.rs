//! Paginated object listing.

use async_stream::try_stream;
use futures::Stream;
use lr_error::Result;
use lr_traits::ObjectStore;
use lr_types::ObjectSummary;
use std::sync::Arc;

/// Lists the objects directly under `prefix`, page by page.
///
/// Keys below a further separator are rolled up by the store and skipped, so
/// every yielded key lives in the same directory as `prefix`. Objects arrive
/// in ascending key order.
///
/// # Example
///
/// ```ignore
/// use futures::{StreamExt, pin_mut};
///
/// let stream = list_objects(store, "bucket1".into(), "example.com/".into());
/// pin_mut!(stream);
///
/// while let Some(result) = stream.next().await {
///     let obj = result?;
///     println!("Found: {} ({} bytes)", obj.key, obj.size);
/// }
/// ```
pub fn list_objects(
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
) -> impl Stream<Item = Result<ObjectSummary>> + Send + 'static {
    try_stream! {
        let mut continuation_token: Option<String> = None;

        loop {
            let page = store
                .list_page(&bucket, &prefix, Some("/"), continuation_token.as_deref())
                .await?;

            for object in page.objects {
                yield object;
            }

            match page.next_continuation {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }
    }
}
