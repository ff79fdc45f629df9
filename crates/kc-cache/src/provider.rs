//! Cache store trait.

use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::BoxStream;

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::pattern::MatchPattern;
use crate::record::Record;

/// A key and the record stored under it.
pub type CacheEntry = (CacheKey, Record);

/// Pluggable key-value store for short-lived credentials.
///
/// Every operation receives the caller's [`CacheConfig`], which is read at
/// call entry; implementations must not cache anything derived from it.
///
/// Writes and deletes are fire-and-forget: returning `Ok(())` means the
/// commands were accepted for dispatch, not that the backend applied them.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stores a batch of records with the configured TTL.
    ///
    /// Fails with `CacheError::Configuration` before any I/O if no TTL is set.
    async fn put_many(&self, config: &CacheConfig, entries: Vec<CacheEntry>) -> CacheResult<()>;

    /// Reads a record.
    ///
    /// Returns `None` if the key was never written or has expired.
    async fn get(&self, config: &CacheConfig, key: &CacheKey) -> CacheResult<Option<Record>>;

    /// Deletes a record.
    ///
    /// Returns `Ok(())` whether or not the key existed.
    async fn delete(&self, config: &CacheConfig, key: &CacheKey) -> CacheResult<()>;

    /// Streams every record whose key matches `pattern`.
    ///
    /// The stream is finite and single-pass. It is not a snapshot: entries
    /// written, deleted or expired while it runs may or may not appear.
    fn scan<'a>(
        &'a self,
        config: &'a CacheConfig,
        pattern: &'a MatchPattern,
    ) -> BoxStream<'a, CacheResult<CacheEntry>>;

    /// Stores a single record with the configured TTL.
    async fn put(&self, config: &CacheConfig, key: CacheKey, record: Record) -> CacheResult<()> {
        self.put_many(config, vec![(key, record)]).await
    }

    /// Collects every record whose key matches `pattern`.
    async fn all(
        &self,
        config: &CacheConfig,
        pattern: &MatchPattern,
    ) -> CacheResult<Vec<CacheEntry>> {
        self.scan(config, pattern).try_collect().await
    }
}
