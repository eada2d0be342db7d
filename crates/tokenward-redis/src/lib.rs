//! Redis-backed [`SessionStore`].
//!
//! Session records are plain string keys holding the principal, written with
//! a millisecond TTL so a record never outlives the token it gates. Deletion
//! uses `GETDEL` so the revoker learns which principal owned the session.
//!
//! Every command is bounded by the configured timeout. A pool, connection or
//! command failure surfaces as `AuthError::StoreUnavailable`, never as a
//! missing session.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokenward_auth::{AuthError, AuthResult, SessionStore};

/// Redis connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Pool and command timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

impl RedisConfig {
    /// Timeout applied to pool operations and each command.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Session store backed by a Redis connection pool.
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: Pool,
    timeout: Duration,
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("pool", &self.pool.status())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RedisSessionStore {
    /// Builds a pool from the config and checks that a connection can be made.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StoreUnavailable` if the pool cannot be created or
    /// the first connection fails.
    pub async fn connect(config: &RedisConfig) -> AuthResult<Self> {
        tracing::info!(url = %config.url, pool_size = config.pool_size, "Connecting to Redis");

        let timeout = config.timeout();
        let mut redis_config = Config::from_url(&config.url);
        if let Some(ref mut pool_config) = redis_config.pool {
            pool_config.max_size = config.pool_size;
            pool_config.timeouts.wait = Some(timeout);
            pool_config.timeouts.create = Some(timeout);
            pool_config.timeouts.recycle = Some(timeout);
        }

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| AuthError::store_unavailable(format!("failed to create pool: {e}")))?;

        let store = Self::from_pool(pool, timeout);
        store.ping().await?;

        tracing::info!("Connected to Redis");
        Ok(store)
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Round-trips a `PING` to the server.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::StoreUnavailable` if Redis cannot be reached.
    pub async fn ping(&self) -> AuthResult<()> {
        self.bounded("PING", async {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(command_error)?;
            Ok(())
        })
        .await
    }

    /// Runs a store operation under the command timeout.
    async fn bounded<T, F>(&self, command: &'static str, operation: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(command, error = %e, "Redis command failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    command,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Redis command timed out"
                );
                Err(AuthError::store_unavailable(format!(
                    "{command} timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

fn pool_error(e: deadpool_redis::PoolError) -> AuthError {
    AuthError::store_unavailable(format!("failed to get Redis connection: {e}"))
}

fn command_error(e: redis::RedisError) -> AuthError {
    AuthError::store_unavailable(format!("Redis error: {e}"))
}

/// Converts a TTL to whole milliseconds, rounding a sub-millisecond TTL up so
/// the record is still written with an expiry.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        let millis = ttl_millis(ttl);
        self.bounded("PSETEX", async {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            conn.pset_ex::<_, _, ()>(key, value, millis)
                .await
                .map_err(command_error)
        })
        .await
    }

    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        self.bounded("GET", async {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            conn.get::<_, Option<String>>(key)
                .await
                .map_err(command_error)
        })
        .await
    }

    async fn delete(&self, key: &str) -> AuthResult<Option<String>> {
        self.bounded("GETDEL", async {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            let previous: Option<String> = redis::cmd("GETDEL")
                .arg(key)
                .query_async(&mut conn)
                .await
                .map_err(command_error)?;
            Ok(previous)
        })
        .await
    }
}
