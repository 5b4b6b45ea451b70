//! Read-through protocol: try the store, fall back to the source of truth,
//! populate best-effort.
//!
//! Populate failures are logged and swallowed; a cache failure never blocks a
//! read. Corrupt cached bytes are treated the same as a miss.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::store::KeyValueStore;

/// Get-or-populate for a single cached value.
pub async fn get_or_load<T, F, Fut>(
    store: &dyn KeyValueStore,
    key: &str,
    ttl: Duration,
    loader: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(bytes) = store.get(key).await {
        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => return Ok(value),
            Err(e) => warn!("Discarding undecodable cache entry {}: {}", key, e),
        }
    }

    let value = loader().await?;
    populate(store, key, ttl, &value).await;
    Ok(value)
}

/// Get-or-populate for a cached collection.
///
/// An empty cached collection is treated as a miss and reloaded from the
/// source of truth, so a legitimately empty resource is re-queried on every
/// request until it has rows. Known inefficiency, kept to avoid pinning an
/// empty snapshot for the full TTL window.
pub async fn get_or_load_list<T, F, Fut>(
    store: &dyn KeyValueStore,
    key: &str,
    ttl: Duration,
    loader: F,
) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if let Some(bytes) = store.get(key).await {
        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(items) if !items.is_empty() => return Ok(items),
            Ok(_) => {}
            Err(e) => warn!("Discarding undecodable cache entry {}: {}", key, e),
        }
    }

    let items = loader().await?;
    if !items.is_empty() {
        populate(store, key, ttl, &items).await;
    }
    Ok(items)
}

async fn populate<T: Serialize>(store: &dyn KeyValueStore, key: &str, ttl: Duration, value: &T) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to encode cache entry {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = store.set(key, &bytes, ttl).await {
        warn!("Failed to populate cache entry {}: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let store = MemoryStore::new();
        store
            .set("k", b"not json", Duration::from_secs(60))
            .await
            .unwrap();

        let calls = AtomicUsize::new(0);
        let value: Vec<i32> = get_or_load_list(&store, "k", Duration::from_secs(60), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        })
        .await
        .unwrap();

        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_value_populates_and_then_hits() {
        let store = MemoryStore::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: u32 = get_or_load(&store, "k", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_collection_is_not_cached() {
        let store = MemoryStore::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<i32> =
                get_or_load_list(&store, "k", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Vec::new())
                })
                .await
                .unwrap();
            assert!(value.is_empty());
        }

        // Both calls hit the loader: the empty result never entered the cache.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.len().await, 0);
    }
}
