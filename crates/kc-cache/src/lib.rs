//! # kc-cache
//!
//! Cache store abstractions for Keycloak Rust.
//!
//! This crate defines the backend-independent parts of the credential cache.
//! The primary implementation is Redis-based (see `kc-cache-redis`).
//!
//! ## Building Blocks
//!
//! - [`key`] - Namespaced structured keys and their colon-joined encoding
//! - [`pattern`] - Wildcard match patterns over structured keys
//! - [`record`] - Stored records and their binary encoding
//! - [`CacheConfig`] - Per-call options (namespace, TTL)
//! - [`CacheStore`] - The pluggable store interface
//!
//! ## Example
//!
//! ```ignore
//! use kc_cache::{CacheConfig, CacheKey, CacheStore, MatchPattern, Record};
//! use std::time::Duration;
//!
//! async fn remember(cache: &impl CacheStore, session_id: &str, data: &Session) -> CacheResult<()> {
//!     let config = CacheConfig::new("myapp")
//!         .namespace("credentials")
//!         .ttl(Duration::from_secs(1800));
//!
//!     cache
//!         .put(&config, CacheKey::from(["session", session_id]), Record::data(data)?)
//!         .await?;
//!
//!     let sessions = cache
//!         .all(&config, &MatchPattern::default().exact("session").wildcard())
//!         .await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod key;
pub mod pattern;
pub mod provider;
pub mod record;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, Namespace};
pub use pattern::{KeyFilter, MatchPattern, Segment};
pub use provider::{CacheEntry, CacheStore};
pub use record::{Identity, Record};
