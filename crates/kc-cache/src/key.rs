//! Structured cache keys.
//!
//! Keys are stored in the backend as colon-joined strings:
//!
//! ```text
//! <app namespace>:<cache namespace>:<segment>:<segment>...
//! ```
//!
//! Segments are not escaped, so a segment must never contain [`DELIMITER`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Separator between key segments.
pub const DELIMITER: char = ':';

/// Joins the namespace and key segments into the backend key.
#[must_use]
pub fn encode(namespace: &Namespace, key: &CacheKey) -> String {
    let mut encoded = namespace.as_str().to_string();
    for segment in &key.0 {
        encoded.push(DELIMITER);
        encoded.push_str(segment);
    }
    encoded
}

/// Splits a backend key into its segments, namespace included.
#[must_use]
pub fn decode(raw: &str) -> Vec<String> {
    raw.split(DELIMITER).map(str::to_string).collect()
}

/// Key prefix scoping all entries of one logical cache.
///
/// Built as `<app namespace>:<cache namespace>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    joined: String,
    segment_count: usize,
}

impl Namespace {
    /// Creates the namespace for an application and cache name.
    #[must_use]
    pub fn new(app_namespace: &str, namespace: &str) -> Self {
        let joined = format!("{app_namespace}{DELIMITER}{namespace}");
        let segment_count = joined.split(DELIMITER).count();
        Self {
            joined,
            segment_count,
        }
    }

    /// Returns the colon-joined namespace.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    /// Returns the glob matching every key in this namespace.
    ///
    /// Glob metacharacters in the namespace are backslash-escaped so they
    /// match literally.
    #[must_use]
    pub fn scan_glob(&self) -> String {
        let mut glob = String::with_capacity(self.joined.len() + 2);
        for c in self.joined.chars() {
            if matches!(c, '*' | '?' | '[' | ']' | '\\') {
                glob.push('\\');
            }
            glob.push(c);
        }
        glob.push(DELIMITER);
        glob.push('*');
        glob
    }

    /// Removes the namespace segments from a decoded backend key.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::MalformedKey` if the key does not start with this
    /// namespace.
    pub fn strip(&self, mut decoded: Vec<String>) -> CacheResult<CacheKey> {
        let in_namespace = decoded.len() > self.segment_count
            && decoded
                .iter()
                .take(self.segment_count)
                .map(String::as_str)
                .eq(self.joined.split(DELIMITER));

        if !in_namespace {
            return Err(CacheError::MalformedKey(format!(
                "`{}` is not in namespace `{}`",
                decoded.join(":"),
                self.joined
            )));
        }

        Ok(CacheKey(decoded.split_off(self.segment_count)))
    }

    /// Decodes a backend key and strips this namespace from it.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::MalformedKey` if the bytes are not UTF-8 or the key
    /// is outside this namespace.
    pub fn decode_key(&self, raw: &[u8]) -> CacheResult<CacheKey> {
        let raw = std::str::from_utf8(raw).map_err(|e| {
            CacheError::MalformedKey(format!("key is not valid UTF-8: {e}"))
        })?;
        self.strip(decode(raw))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

/// Caller key: an ordered list of segments, without the namespace.
///
/// Typically `[record type, field name, field value]`, but the segments are
/// opaque to the cache. Keys order lexicographically by segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Creates a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the key segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the key has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that the key has segments and none contains the delimiter.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::InvalidKey` naming the offending segment.
    pub fn validate(&self) -> CacheResult<()> {
        if self.0.is_empty() {
            return Err(CacheError::InvalidKey("key has no segments".to_string()));
        }
        match self.0.iter().find(|s| s.contains(DELIMITER)) {
            Some(segment) => Err(CacheError::InvalidKey(format!(
                "segment `{segment}` contains `{DELIMITER}`"
            ))),
            None => Ok(()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(":"))
    }
}

impl From<Vec<String>> for CacheKey {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for CacheKey {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<&[&str]> for CacheKey {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}
