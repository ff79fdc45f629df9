//! Match patterns over structured keys.

use std::fmt;

use crate::key::CacheKey;

/// One position of a [`MatchPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches only this exact segment.
    Exact(String),
    /// Matches any segment at this position.
    Any,
}

impl Segment {
    /// Creates an exact segment.
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == segment,
            Self::Any => true,
        }
    }
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Self::Exact(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Self::Exact(value)
    }
}

/// Key template with wildcard positions.
///
/// A key matches when it has exactly as many segments as the pattern and every
/// exact segment is equal at its position. Wildcards never absorb extra
/// segments.
///
/// ```
/// use kc_cache::{CacheKey, MatchPattern, Segment};
///
/// let pattern = MatchPattern::new(["user".into(), Segment::Any]);
/// assert!(pattern.matches(&CacheKey::from(["user", "1"])));
/// assert!(!pattern.matches(&CacheKey::from(["user", "1", "email"])));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MatchPattern(Vec<Segment>);

impl MatchPattern {
    /// Creates a pattern from its segments.
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Creates a pattern of `len` wildcards.
    #[must_use]
    pub fn any(len: usize) -> Self {
        Self(vec![Segment::Any; len])
    }

    /// Appends an exact segment.
    #[must_use]
    pub fn exact(mut self, value: impl Into<String>) -> Self {
        self.0.push(Segment::exact(value));
        self
    }

    /// Appends a wildcard segment.
    #[must_use]
    pub fn wildcard(mut self) -> Self {
        self.0.push(Segment::Any);
        self
    }

    /// Returns the pattern segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Tests a single key against the pattern.
    #[must_use]
    pub fn matches(&self, key: &CacheKey) -> bool {
        key.len() == self.0.len()
            && self
                .0
                .iter()
                .zip(key.segments())
                .all(|(pattern, segment)| pattern.matches(segment))
    }

    /// Compiles the pattern into a filter for testing many keys.
    #[must_use]
    pub fn compile(&self) -> KeyFilter {
        KeyFilter {
            len: self.0.len(),
            fixed: self
                .0
                .iter()
                .enumerate()
                .filter_map(|(position, segment)| match segment {
                    Segment::Exact(value) => Some((position, value.clone())),
                    Segment::Any => None,
                })
                .collect(),
        }
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            match segment {
                Segment::Exact(value) => f.write_str(value)?,
                Segment::Any => f.write_str("_")?,
            }
        }
        Ok(())
    }
}

/// Compiled form of a [`MatchPattern`].
///
/// Only the exact positions are kept; wildcard positions need no comparison.
#[derive(Debug, Clone)]
pub struct KeyFilter {
    len: usize,
    fixed: Vec<(usize, String)>,
}

impl KeyFilter {
    /// Tests a single key.
    #[must_use]
    pub fn matches(&self, key: &CacheKey) -> bool {
        let segments = key.segments();
        segments.len() == self.len
            && self
                .fixed
                .iter()
                .all(|(position, value)| segments[*position] == *value)
    }

    /// Keeps the items whose key matches, preserving their order.
    pub fn retain<T>(&self, items: &mut Vec<T>, key_of: impl Fn(&T) -> &CacheKey) {
        items.retain(|item| self.matches(key_of(item)));
    }
}
