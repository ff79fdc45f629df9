//! Cache store against a real Redis server.
//!
//! These tests start a Redis container and need Docker:
//!
//! ```text
//! cargo test -p kc-cache-redis --test redis_server -- --ignored
//! ```

use std::time::Duration;

use kc_cache::{CacheConfig, CacheKey, CacheStore, Identity, MatchPattern, Record};
use kc_cache_redis::{RedisCacheStore, RedisClient, RedisConfig};
use serde_json::json;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::redis::Redis;
use tokio::time::sleep;
use uuid::Uuid;

/// Redis container plus a connected store.
struct TestEnv {
    _redis: ContainerAsync<Redis>,
    store: RedisCacheStore<RedisClient>,
}

impl TestEnv {
    async fn new() -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("kc_cache_redis=debug,fred=warn")
            .try_init();

        let redis = Redis::default().with_tag("7-alpine").start().await?;
        let port = redis.get_host_port_ipv4(6379).await?;

        let config = RedisConfig::default()
            .host("127.0.0.1")
            .port(port)
            .pool_size(2)
            .scan_count(2);
        let store = RedisCacheStore::connect(&config).await?;

        Ok(Self {
            _redis: redis,
            store,
        })
    }
}

fn credentials() -> CacheConfig {
    CacheConfig::new("myapp")
        .namespace("credentials")
        .ttl(Duration::from_secs(60))
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn single_key_operations() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let config = credentials();
    let key = CacheKey::from(["session", "abc"]);

    env.store
        .put(&config, key.clone(), Record::Data(json!({"user": "alice"})))
        .await?;
    assert_eq!(
        env.store.get(&config, &key).await?,
        Some(Record::Data(json!({"user": "alice"})))
    );

    env.store.delete(&config, &key).await?;
    assert_eq!(env.store.get(&config, &key).await?, None);

    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn entries_expire_after_ttl() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let config = credentials().ttl_millis(200);
    let key = CacheKey::from(["token", "short"]);

    env.store.put(&config, key.clone(), Record::Data(json!(1))).await?;
    assert!(env.store.get(&config, &key).await?.is_some());

    sleep(Duration::from_millis(300)).await;
    assert_eq!(env.store.get(&config, &key).await?, None);

    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn scan_matches_pattern() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let config = credentials();
    let identity = Identity::new(Uuid::new_v4(), Uuid::new_v4());

    let mut entries = vec![
        (CacheKey::from(["user", "1"]), Record::Identity(identity.clone())),
        (CacheKey::from(["token", "x"]), Record::Data(json!("C"))),
    ];
    entries.extend((2..20).map(|i| {
        (
            CacheKey::new(["user".to_string(), i.to_string()]),
            Record::Data(json!(i)),
        )
    }));
    env.store.put_many(&config, entries).await?;
    env.store
        .put(
            &config.clone().namespace("other"),
            CacheKey::from(["user", "99"]),
            Record::Data(json!(99)),
        )
        .await?;

    let users = env
        .store
        .all(&config, &MatchPattern::default().exact("user").wildcard())
        .await?;
    assert_eq!(users.len(), 19);
    assert!(users.iter().all(|(key, _)| key.segments()[0] == "user"));
    assert!(users.contains(&(CacheKey::from(["user", "1"]), Record::Identity(identity))));

    let none = env.store.all(&config, &MatchPattern::any(3)).await?;
    assert!(none.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn bracketed_namespace_finds_its_own_keys() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let config = CacheConfig::new("app[1]").ttl(Duration::from_secs(60));
    let entry = (CacheKey::from(["user", "1"]), Record::Data(json!("A")));

    env.store.put(&config, entry.0.clone(), entry.1.clone()).await?;
    env.store
        .put(
            &CacheConfig::new("app1").ttl(Duration::from_secs(60)),
            CacheKey::from(["user", "2"]),
            Record::Data(json!("B")),
        )
        .await?;

    let entries = env.store.all(&config, &MatchPattern::any(2)).await?;
    assert_eq!(entries, vec![entry]);

    Ok(())
}
