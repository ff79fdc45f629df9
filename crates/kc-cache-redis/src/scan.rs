//! Cursor-driven scan over a cache namespace.
//!
//! Each step of a [`KeyScan`] fetches one `SCAN` page, keeps the keys that
//! match the pattern, and hydrates them with a single `MGET`. The scan is
//! single-pass: once complete, or after an error, it yields nothing more.

use std::collections::HashSet;

use futures::stream::{self, Stream, TryStreamExt};
use kc_cache::key::{Namespace, encode};
use kc_cache::record;
use kc_cache::{CacheEntry, CacheError, CacheKey, CacheResult, KeyFilter, MatchPattern};

use crate::client::{Command, SCAN_START, StoreClient};

enum ScanState {
    Pending(String),
    Done,
}

/// Scan of every entry in a namespace whose key matches a pattern.
pub struct KeyScan<'a, C: ?Sized> {
    client: &'a C,
    namespace: Namespace,
    glob: String,
    filter: KeyFilter,
    count: Option<u32>,
    state: ScanState,
    seen: HashSet<CacheKey>,
}

impl<'a, C: StoreClient + ?Sized> KeyScan<'a, C> {
    /// Creates a scan positioned at the start of the keyspace.
    pub fn new(client: &'a C, namespace: Namespace, pattern: &MatchPattern) -> Self {
        Self {
            client,
            glob: namespace.scan_glob(),
            namespace,
            filter: pattern.compile(),
            count: None,
            state: ScanState::Pending(SCAN_START.to_string()),
            seen: HashSet::new(),
        }
    }

    /// Sets the `COUNT` hint sent with every page request.
    #[must_use]
    pub const fn with_count(mut self, count: Option<u32>) -> Self {
        self.count = count;
        self
    }

    /// Checks if the scan has finished.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.state, ScanState::Done)
    }

    /// Fetches the next page of matching entries.
    ///
    /// Returns `None` once the scan is complete. A page may be empty while
    /// the scan is still in progress. Entries are sorted by key within a page.
    ///
    /// ## Errors
    ///
    /// Returns an error if a command fails, a key is outside the namespace, or
    /// a value cannot be decoded. The scan is finished afterwards.
    pub async fn next_batch(&mut self) -> CacheResult<Option<Vec<CacheEntry>>> {
        let cursor = match std::mem::replace(&mut self.state, ScanState::Done) {
            ScanState::Pending(cursor) => cursor,
            ScanState::Done => return Ok(None),
        };

        let (next_cursor, raw_keys) = self
            .client
            .execute(Command::Scan {
                cursor,
                pattern: self.glob.clone(),
                count: self.count,
            })
            .await?
            .into_scan_page()?;
        let page_size = raw_keys.len();

        let mut matched = raw_keys
            .iter()
            .map(|raw| self.namespace.decode_key(raw))
            .collect::<CacheResult<Vec<_>>>()?;
        self.filter.retain(&mut matched, |key| key);
        matched.retain(|key| self.seen.insert(key.clone()));
        matched.sort();

        let entries = self.fetch(matched).await?;
        tracing::debug!(
            namespace = %self.namespace,
            page_size,
            entries = entries.len(),
            "Scanned cache page"
        );

        if next_cursor != SCAN_START {
            self.state = ScanState::Pending(next_cursor);
        }
        Ok(Some(entries))
    }

    async fn fetch(&self, keys: Vec<CacheKey>) -> CacheResult<Vec<CacheEntry>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let raw_keys = keys
            .iter()
            .map(|key| encode(&self.namespace, key))
            .collect();
        let values = self
            .client
            .execute(Command::MGet { keys: raw_keys })
            .await?
            .into_values()?;

        if values.len() != keys.len() {
            return Err(CacheError::UnexpectedReply {
                command: "MGET",
                reply: format!("{} values for {} keys", values.len(), keys.len()),
            });
        }

        // A missing value was deleted or expired after the SCAN page.
        keys.into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|bytes| (key, bytes)))
            .map(|(key, bytes)| record::deserialize(&bytes).map(|record| (key, record)))
            .collect()
    }

    /// Turns the scan into a stream of entries.
    pub fn into_stream(self) -> impl Stream<Item = CacheResult<CacheEntry>> + Send + 'a
    where
        C: 'a,
    {
        stream::try_unfold(self, |mut scan| async move {
            let batch = scan.next_batch().await?;
            Ok::<_, CacheError>(batch.map(|batch| (batch, scan)))
        })
        .map_ok(|batch| stream::iter(batch.into_iter().map(Ok::<CacheEntry, CacheError>)))
        .try_flatten()
    }
}
