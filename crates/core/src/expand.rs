use navtree_store::{StoreError, TreeStore};
use navtree_traits::FetchError;
use navtree_types::Node;
use std::future::Future;
use std::time::Duration;

/// Expands `path`, giving up after `timeout` if one is set.
///
/// Expiry is reported as a fetch failure. The underlying fetch is not
/// cancelled: it stays registered in the store and a later expansion joins it.
pub(crate) async fn expand_within(
    store: &TreeStore,
    path: &[usize],
    timeout: Option<Duration>,
) -> Result<Vec<Node>, StoreError> {
    within(store, path, timeout, store.expand(path)).await
}

/// Loads the subtree at `path` without expanding it, under the same timeout rules.
pub(crate) async fn resolve_within(
    store: &TreeStore,
    path: &[usize],
    timeout: Option<Duration>,
) -> Result<Vec<Node>, StoreError> {
    within(store, path, timeout, store.resolve(path)).await
}

async fn within<F>(
    store: &TreeStore,
    path: &[usize],
    timeout: Option<Duration>,
    work: F,
) -> Result<Vec<Node>, StoreError>
where
    F: Future<Output = Result<Vec<Node>, StoreError>>,
{
    let Some(limit) = timeout else {
        return work.await;
    };
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            let token = store.reference(path)?.unwrap_or_default();
            log::warn!(
                "Loading {:?} timed out after {} ms (subtree '{}')",
                path,
                limit.as_millis(),
                token
            );
            Err(StoreError::Fetch {
                token: token.clone(),
                source: FetchError::TimedOut {
                    token,
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                },
            })
        }
    }
}
