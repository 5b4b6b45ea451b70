use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use deadpool_redis::Pool as RedisPool;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Key/value backend for cached snapshots.
///
/// `get` swallows backend errors and reports them as a miss: a cache failure
/// never blocks a read, it only removes the speed-up.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Enumerate keys matching a glob pattern (e.g. `invoices:*`).
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>>;
}

/// Redis-backed store over a deadpool connection pool.
pub struct RedisStore {
    pool: RedisPool,
}

impl RedisStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                return None;
            }
        };

        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(Some(data)) => {
                debug!("Cache HIT: {}", key);
                Some(data)
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                None
            }
            Err(e) => {
                error!("Redis error reading {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        debug!("Cached {} (ttl {}s)", key, ttl.as_secs());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(key).await?;
        debug!("Invalidated {}", key);
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(keys)
    }
}

/// In-process store used by the test suite and local development.
///
/// Honors TTL expiry on read and supports `prefix*` glob patterns, which is
/// the only pattern shape the invalidation fanout produces.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|(_, expiry)| *expiry > now)
            .count()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }
}

fn glob_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((data, expiry)) if *expiry > Instant::now() => Some(data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let expiry = Instant::now() + ttl;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_vec(), expiry));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.entries.lock().await.remove(key).is_none() {
            warn!("delete on absent key {}", key);
        }
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(_, (_, expiry))| *expiry > now)
            .map(|(k, _)| k.clone())
            .filter(|k| glob_matches(pattern, k))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_expires_entries() {
        let store = MemoryStore::new();
        store
            .set("k", b"v", Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(store.get("k").await, Some(b"v".to_vec()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn memory_store_scans_prefix_patterns() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set("invoices:all", b"1", ttl).await.unwrap();
        store.set("invoices:admin:5", b"1", ttl).await.unwrap();
        store.set("orders:all", b"1", ttl).await.unwrap();

        let mut keys = store.scan_keys("invoices:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["invoices:admin:5", "invoices:all"]);
    }
}
