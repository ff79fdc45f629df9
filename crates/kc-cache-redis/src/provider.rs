//! Redis cache store implementation.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use kc_cache::key::encode;
use kc_cache::record;
use kc_cache::{
    CacheConfig, CacheEntry, CacheKey, CacheResult, CacheStore, MatchPattern, Record,
};

use crate::client::{Command, StoreClient};
use crate::config::RedisConfig;
use crate::redis::RedisClient;
use crate::scan::KeyScan;

/// Redis-based cache store.
///
/// Generic over the [`StoreClient`] so the same logic runs against Redis
/// ([`RedisClient`]) or in process ([`InMemoryClient`](crate::InMemoryClient)).
pub struct RedisCacheStore<C = RedisClient> {
    client: C,
    scan_count: Option<u32>,
}

impl RedisCacheStore<RedisClient> {
    /// Connects to Redis and creates a store on top of the connection.
    ///
    /// ## Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let client = RedisClient::connect(config).await?;
        Ok(Self::new(client).with_scan_count(config.scan_count))
    }
}

impl<C: StoreClient> RedisCacheStore<C> {
    /// Creates a store over an existing client.
    pub const fn new(client: C) -> Self {
        Self {
            client,
            scan_count: None,
        }
    }

    /// Sets the `COUNT` hint used by scans.
    #[must_use]
    pub const fn with_scan_count(mut self, count: Option<u32>) -> Self {
        self.scan_count = count;
        self
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Starts a page-by-page scan of the entries matching `pattern`.
    pub fn key_scan(&self, config: &CacheConfig, pattern: &MatchPattern) -> KeyScan<'_, C> {
        KeyScan::new(&self.client, config.key_namespace(), pattern).with_count(self.scan_count)
    }
}

#[async_trait]
impl<C: StoreClient> CacheStore for RedisCacheStore<C> {
    async fn put_many(&self, config: &CacheConfig, entries: Vec<CacheEntry>) -> CacheResult<()> {
        let ttl_ms = config.require_ttl()?;
        let namespace = config.key_namespace();

        let commands = entries
            .iter()
            .map(|(key, value)| -> CacheResult<Command> {
                key.validate()?;
                Ok(Command::Set {
                    key: encode(&namespace, key),
                    value: record::serialize(value)?,
                    ttl_ms,
                })
            })
            .collect::<CacheResult<Vec<_>>>()?;

        if commands.is_empty() {
            return Ok(());
        }

        tracing::debug!(%namespace, entries = commands.len(), ttl_ms, "Queued cache writes");
        self.client.execute_fire_and_forget(commands)
    }

    async fn get(&self, config: &CacheConfig, key: &CacheKey) -> CacheResult<Option<Record>> {
        key.validate()?;
        let key = encode(&config.key_namespace(), key);

        self.client
            .execute(Command::Get { key })
            .await?
            .into_value()?
            .map(|bytes| record::deserialize(&bytes))
            .transpose()
    }

    async fn delete(&self, config: &CacheConfig, key: &CacheKey) -> CacheResult<()> {
        key.validate()?;
        let key = encode(&config.key_namespace(), key);

        tracing::debug!(%key, "Queued cache delete");
        self.client.execute_fire_and_forget(vec![Command::Del { key }])
    }

    fn scan<'a>(
        &'a self,
        config: &'a CacheConfig,
        pattern: &'a MatchPattern,
    ) -> BoxStream<'a, CacheResult<CacheEntry>> {
        self.key_scan(config, pattern).into_stream().boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kc_cache::CacheError;
    use serde_json::json;

    use super::*;
    use crate::memory::InMemoryClient;

    fn config() -> CacheConfig {
        CacheConfig::new("myapp")
            .namespace("credentials")
            .ttl(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn writes_are_namespaced() {
        let store = RedisCacheStore::new(InMemoryClient::new());
        store
            .put(&config(), CacheKey::from(["user", "1"]), Record::Data(json!("a")))
            .await
            .unwrap();

        let raw = store
            .client()
            .execute(Command::Get {
                key: "myapp:credentials:user:1".to_string(),
            })
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert!(raw.is_some());
    }

    #[tokio::test]
    async fn batch_put_is_one_dispatch() {
        let store = RedisCacheStore::new(InMemoryClient::new());
        let entries = (0..3)
            .map(|i| (CacheKey::new(["user".to_string(), i.to_string()]), Record::Data(json!(i))))
            .collect();
        store.put_many(&config(), entries).await.unwrap();
        assert_eq!(store.client().commands_executed(), 3);
        assert_eq!(store.client().len(), 3);
    }

    #[tokio::test]
    async fn empty_batch_dispatches_nothing() {
        let store = RedisCacheStore::new(InMemoryClient::new());
        store.put_many(&config(), Vec::new()).await.unwrap();
        assert_eq!(store.client().commands_executed(), 0);
    }

    #[tokio::test]
    async fn keys_with_delimiter_are_rejected() {
        let store = RedisCacheStore::new(InMemoryClient::new());
        let key = CacheKey::from(["user", "a:b"]);

        let err = store
            .put(&config(), key.clone(), Record::Data(json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey(_)));
        assert!(store.get(&config(), &key).await.is_err());
        assert!(store.delete(&config(), &key).await.is_err());
        assert_eq!(store.client().commands_executed(), 0);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = RedisCacheStore::new(InMemoryClient::new());
        let key = CacheKey::from(["token", "x"]);
        store
            .put(&config(), key.clone(), Record::Data(json!("c")))
            .await
            .unwrap();

        let other = config().namespace("sessions");
        assert_eq!(store.get(&other, &key).await.unwrap(), None);
        assert!(
            store
                .all(&other, &MatchPattern::any(2))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
