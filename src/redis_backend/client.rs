//! Connection handling for the shared backend.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::config::KvBackendConfig;
use crate::error::RateLimitError;

/// Thin wrapper around a `ConnectionManager`, which reconnects on its own
/// and is cheap to clone, so every limiter just clones one of these rather
/// than pooling connections itself.
#[derive(Clone)]
pub struct KvClient {
    conn: ConnectionManager,
}

impl KvClient {
    pub async fn connect(config: &KvBackendConfig) -> Result<Self, RateLimitError> {
        debug!(url = %config.redis_url, "connecting to shared backend");
        let client = redis::Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// `PING`s the backend; used by the `/health` endpoint.
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }

    #[allow(dead_code)]
    pub async fn delete(&self, key: &str) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del(key).await?;
        Ok(())
    }
}
