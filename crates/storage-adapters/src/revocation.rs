//! Token denylists.
//!
//! An entry only needs to outlive the token it blocks, so every entry carries
//! the token's own expiry and disappears after it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{Result, RevocationStore};

#[derive(Default)]
pub struct MemoryRevocationStore {
    revoked: DashMap<String, DateTime<Utc>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        self.revoked.retain(|_, expires_at| *expires_at > now);
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<bool> {
        let now = Utc::now();
        self.purge_expired(now);
        if expires_at <= now {
            return Ok(true);
        }
        match self.revoked.entry(token_id.to_string()) {
            Entry::Occupied(mut slot) => {
                if *slot.get() > now {
                    return Ok(false);
                }
                slot.insert(expires_at);
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
            }
        }
        Ok(true)
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool> {
        Ok(self
            .revoked
            .get(token_id)
            .is_some_and(|expires_at| *expires_at > Utc::now()))
    }
}

#[cfg(feature = "redis")]
pub use self::redis_store::RedisRevocationStore;

#[cfg(feature = "redis")]
mod redis_store {
    use anyhow::Context;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use deadpool_redis::{redis, Config, Pool, Runtime};
    use domains::{DomainError, Result, RevocationStore};
    use tracing::error;

    const KEY_PREFIX: &str = "revoked_token:";

    /// Revocations shared by every instance behind the load balancer.
    pub struct RedisRevocationStore {
        pool: Pool,
    }

    impl RedisRevocationStore {
        pub fn connect(url: &str) -> anyhow::Result<Self> {
            let pool = Config::from_url(url)
                .create_pool(Some(Runtime::Tokio1))
                .context("failed to create redis pool")?;
            Ok(Self { pool })
        }

        async fn conn(&self) -> Result<deadpool_redis::Connection> {
            self.pool.get().await.map_err(|e| {
                error!(error = %e, "redis pool exhausted or unreachable");
                DomainError::internal(e)
            })
        }
    }

    #[async_trait]
    impl RevocationStore for RedisRevocationStore {
        async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<bool> {
            let ttl = (expires_at - Utc::now()).num_seconds();
            if ttl <= 0 {
                return Ok(true);
            }
            let mut conn = self.conn().await?;
            // NX replies nil when the key already exists.
            let stored = redis::cmd("SET")
                .arg(format!("{KEY_PREFIX}{token_id}"))
                .arg(1)
                .arg("NX")
                .arg("EX")
                .arg(ttl)
                .query_async::<Option<String>>(&mut conn)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to store revoked token");
                    DomainError::internal(e)
                })?;
            Ok(stored.is_some())
        }

        async fn is_revoked(&self, token_id: &str) -> Result<bool> {
            let mut conn = self.conn().await?;
            redis::cmd("EXISTS")
                .arg(format!("{KEY_PREFIX}{token_id}"))
                .query_async::<bool>(&mut conn)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to check revoked token");
                    DomainError::internal(e)
                })
        }
    }
}
