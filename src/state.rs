use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::sync::Arc;

use crate::cache::{InvalidationFanout, KeyValueStore, RedisStore};
use crate::db::PgStaffDirectory;

/// Shared application state. Everything handlers need is injected here;
/// nothing reads connections from globals.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub store: Arc<dyn KeyValueStore>,
    pub fanout: InvalidationFanout,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|e| anyhow::anyhow!("DATABASE_URL must be set: {}", e))?;
        let db_pool = PgPoolOptions::new()
            .max_connections(
                env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
            )
            .connect(&database_url)
            .await?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let redis_pool = deadpool_redis::Config::from_url(&redis_url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| anyhow::anyhow!("Failed to create Redis pool: {}", e))?;

        let store: Arc<dyn KeyValueStore> = Arc::new(RedisStore::new(redis_pool));
        let directory = Arc::new(PgStaffDirectory::new(db_pool.clone()));
        let fanout = InvalidationFanout::new(Arc::clone(&store), directory);

        Ok(AppState {
            db_pool,
            store,
            fanout,
        })
    }
}
