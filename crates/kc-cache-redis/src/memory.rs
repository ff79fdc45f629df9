//! In-memory store client.
//!
//! For development and testing. Behaves like a single Redis node: entries
//! expire after their TTL, and `SCAN` walks the keyspace in fixed-size pages
//! with `MATCH` applied after paging, so a page may come back empty before
//! the scan is complete.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kc_cache::{CacheError, CacheResult};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::client::{Command, Reply, SCAN_START, StoreClient};

const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on entry lifetime; longer TTLs are clamped.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Prefix of cursors handed out by [`InMemoryClient`]; never equal to [`SCAN_START`].
const CURSOR_PREFIX: char = '>';

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process [`StoreClient`].
pub struct InMemoryClient {
    entries: Mutex<BTreeMap<String, Entry>>,
    page_size: usize,
    commands: AtomicU64,
}

impl InMemoryClient {
    /// Creates an empty store with the default scan page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty store whose scans return `page_size` keys per page
    /// unless the command carries a `COUNT` hint.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
            commands: AtomicU64::new(0),
        }
    }

    /// Returns the number of commands executed or dispatched so far.
    #[must_use]
    pub fn commands_executed(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Checks if the store holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(&self, command: Command) -> CacheResult<Reply> {
        self.commands.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match command {
            Command::Set { key, value, ttl_ms } => {
                let expires_at = now
                    .checked_add(Duration::from_millis(ttl_ms))
                    .unwrap_or_else(|| now + MAX_TTL);
                entries.insert(key, Entry { value, expires_at });
                Ok(Reply::Ok)
            }
            Command::Get { key } => Ok(Reply::Value(live_value(&mut entries, &key, now))),
            Command::Del { key } => {
                entries.remove(&key);
                Ok(Reply::Ok)
            }
            Command::MGet { keys } => Ok(Reply::Values(
                keys.iter()
                    .map(|key| live_value(&mut entries, key, now))
                    .collect(),
            )),
            Command::Scan {
                cursor,
                pattern,
                count,
            } => {
                let lower = if cursor == SCAN_START {
                    Bound::Unbounded
                } else {
                    let last = cursor.strip_prefix(CURSOR_PREFIX).ok_or_else(|| {
                        CacheError::Internal(format!("invalid scan cursor `{cursor}`"))
                    })?;
                    Bound::Excluded(last.to_string())
                };

                let page_size = count.map_or(self.page_size, |c| (c as usize).max(1));
                let page: Vec<&String> = entries
                    .range((lower, Bound::Unbounded))
                    .filter(|(_, entry)| entry.expires_at > now)
                    .map(|(key, _)| key)
                    .take(page_size + 1)
                    .collect();

                let (page, more) = if page.len() > page_size {
                    (&page[..page_size], true)
                } else {
                    (&page[..], false)
                };
                let cursor = match page.last() {
                    Some(last) if more => format!("{CURSOR_PREFIX}{last}"),
                    _ => SCAN_START.to_string(),
                };
                let keys = page
                    .iter()
                    .filter(|key| glob_match(&pattern, key))
                    .map(|key| key.as_bytes().to_vec())
                    .collect();

                Ok(Reply::ScanPage { cursor, keys })
            }
        }
    }
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for InMemoryClient {
    async fn execute(&self, command: Command) -> CacheResult<Reply> {
        self.apply(command)
    }

    fn execute_fire_and_forget(&self, commands: Vec<Command>) -> CacheResult<()> {
        for command in commands {
            if let Err(e) = self.apply(command) {
                tracing::warn!("Fire-and-forget command failed: {}", e);
            }
        }
        Ok(())
    }
}

fn live_value(entries: &mut BTreeMap<String, Entry>, key: &str, now: Instant) -> Option<Vec<u8>> {
    match entries.get(key) {
        Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
        Some(_) => {
            entries.remove(key);
            None
        }
        None => None,
    }
}

/// Redis-style glob matching supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('\\') if pattern.get(p + 1) == Some(&text[t]) => {
                p += 2;
                t += 1;
            }
            Some(&c) if c != '\\' && (c == '?' || c == text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
