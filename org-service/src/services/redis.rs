use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use std::collections::HashMap;
use std::sync::Mutex;

/// Stores the latest refresh token issued to each user.
#[async_trait]
pub trait TokenCache: Send + Sync {
    async fn set_refresh_token(
        &self,
        user_id: &str,
        token: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error>;
    async fn get_refresh_token(&self, user_id: &str) -> Result<Option<String>, anyhow::Error>;
    /// Replaces the stored token with `next` only if it still equals `current`.
    /// Returns false when another token (or none) is stored.
    async fn rotate_refresh_token(
        &self,
        user_id: &str,
        current: &str,
        next: &str,
        expiry_seconds: i64,
    ) -> Result<bool, anyhow::Error>;
    async fn revoke_refresh_token(&self, user_id: &str) -> Result<(), anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

pub fn refresh_token_key(user_id: &str) -> String {
    format!("refresh_token:{}", user_id)
}

// KEYS[1] = key, ARGV[1] = expected token, ARGV[2] = new token, ARGV[3] = ttl
const ROTATE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
    return 1
end
return 0
"#;

#[derive(Clone)]
pub struct RedisService {
    manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to get Redis connection manager");
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl TokenCache for RedisService {
    async fn set_refresh_token(
        &self,
        user_id: &str,
        token: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(refresh_token_key(user_id))
            .arg(token)
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store refresh token: {}", e))
    }

    async fn get_refresh_token(&self, user_id: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(refresh_token_key(user_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read refresh token: {}", e))
    }

    async fn rotate_refresh_token(
        &self,
        user_id: &str,
        current: &str,
        next: &str,
        expiry_seconds: i64,
    ) -> Result<bool, anyhow::Error> {
        let mut conn = self.manager.clone();
        let swapped: i64 = redis::Script::new(ROTATE_SCRIPT)
            .key(refresh_token_key(user_id))
            .arg(current)
            .arg(next)
            .arg(expiry_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to rotate refresh token: {}", e))?;
        Ok(swapped == 1)
    }

    async fn revoke_refresh_token(&self, user_id: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(refresh_token_key(user_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to revoke refresh token: {}", e))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))?;
        Ok(())
    }
}

/// In-process cache for tests. Expiry is recorded but not enforced.
#[derive(Default)]
pub struct MockTokenCache {
    pub entries: Mutex<HashMap<String, (String, i64)>>,
    pub unhealthy: std::sync::atomic::AtomicBool,
}

impl MockTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy
            .store(unhealthy, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn expiry_for(&self, user_id: &str) -> Option<i64> {
        self.entries
            .lock()
            .ok()?
            .get(&refresh_token_key(user_id))
            .map(|(_, expiry)| *expiry)
    }
}

#[async_trait]
impl TokenCache for MockTokenCache {
    async fn set_refresh_token(
        &self,
        user_id: &str,
        token: &str,
        expiry_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .insert(
                refresh_token_key(user_id),
                (token.to_string(), expiry_seconds),
            );
        Ok(())
    }

    async fn get_refresh_token(&self, user_id: &str) -> Result<Option<String>, anyhow::Error> {
        let value = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .get(&refresh_token_key(user_id))
            .map(|(token, _)| token.clone());
        Ok(value)
    }

    async fn rotate_refresh_token(
        &self,
        user_id: &str,
        current: &str,
        next: &str,
        expiry_seconds: i64,
    ) -> Result<bool, anyhow::Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?;

        let key = refresh_token_key(user_id);
        match entries.get(&key) {
            Some((stored, _)) if stored == current => {
                entries.insert(key, (next.to_string(), expiry_seconds));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_refresh_token(&self, user_id: &str) -> Result<(), anyhow::Error> {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .remove(&refresh_token_key(user_id));
        Ok(())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        if self.unhealthy.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("mock cache marked unhealthy");
        }
        Ok(())
    }
}
