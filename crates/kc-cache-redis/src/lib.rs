//! # kc-cache-redis
//!
//! Redis cache store for Keycloak Rust.
//!
//! This crate provides the Redis-backed [`CacheStore`](kc_cache::CacheStore)
//! used to persist short-lived credentials, built on the `fred` crate.
//!
//! ## Features
//!
//! - Namespaced structured keys with per-write TTLs
//! - Fire-and-forget pipelined writes and deletes, dispatched in order with reads
//! - Cursor-driven pattern scans with bulk hydration via `MGET`
//! - Pooled connections with automatic reconnection and exponential backoff
//! - An in-process client for development and tests
//!
//! ## Example
//!
//! ```ignore
//! use kc_cache::{CacheConfig, CacheKey, CacheStore, MatchPattern, Record};
//! use kc_cache_redis::{RedisCacheStore, RedisConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = RedisCacheStore::connect(&RedisConfig::from_env()?).await?;
//!     let config = CacheConfig::new("myapp")
//!         .namespace("credentials")
//!         .ttl(Duration::from_secs(1800));
//!
//!     cache
//!         .put(&config, CacheKey::from(["user", "1"]), Record::data(&"token")?)
//!         .await?;
//!     let users = cache
//!         .all(&config, &MatchPattern::default().exact("user").wildcard())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod provider;
pub mod redis;
pub mod scan;

pub use client::{Command, Reply, SCAN_START, StoreClient};
pub use config::RedisConfig;
pub use memory::InMemoryClient;
pub use provider::RedisCacheStore;
pub use redis::RedisClient;
pub use scan::KeyScan;
