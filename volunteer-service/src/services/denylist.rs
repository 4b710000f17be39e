use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Denylist for revoked refresh tokens, keyed by `jti`. Entries expire
/// with the token they shadow, so the set stays bounded.
#[async_trait]
pub trait TokenDenylist: Send + Sync {
    async fn revoke(&self, jti: &str, ttl_seconds: i64) -> Result<(), anyhow::Error>;
    async fn is_revoked(&self, jti: &str) -> Result<bool, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

const DENYLIST_PREFIX: &str = "denylist:jti:";

/// Redis-backed denylist. TTL handling is delegated to Redis key expiry.
#[derive(Clone)]
pub struct RedisDenylist {
    conn: ConnectionManager,
}

impl RedisDenylist {
    pub async fn connect(redis_url: &str) -> Result<Self, anyhow::Error> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn key(jti: &str) -> String {
        format!("{}{}", DENYLIST_PREFIX, jti)
    }
}

#[async_trait]
impl TokenDenylist for RedisDenylist {
    async fn revoke(&self, jti: &str, ttl_seconds: i64) -> Result<(), anyhow::Error> {
        // A token at (or past) expiry needs no entry; Redis rejects
        // non-positive expirations anyway.
        if ttl_seconds <= 0 {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(jti), 1, ttl_seconds as u64)
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(Self::key(jti)).await?;
        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

/// In-memory denylist for tests. TTLs are recorded but never expire.
#[derive(Default)]
pub struct MockDenylist {
    revoked: std::sync::Mutex<std::collections::HashMap<String, i64>>,
}

impl MockDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_ttl(&self, jti: &str) -> Option<i64> {
        self.revoked.lock().unwrap().get(jti).copied()
    }
}

#[async_trait]
impl TokenDenylist for MockDenylist {
    async fn revoke(&self, jti: &str, ttl_seconds: i64) -> Result<(), anyhow::Error> {
        if ttl_seconds <= 0 {
            return Ok(());
        }
        self.revoked
            .lock()
            .unwrap()
            .insert(jti.to_string(), ttl_seconds);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, anyhow::Error> {
        Ok(self.revoked.lock().unwrap().contains_key(jti))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
