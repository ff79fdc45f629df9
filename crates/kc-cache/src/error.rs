//! Cache error types.

use thiserror::Error;

/// Cache operation errors.
///
/// A missing key is not an error: reads return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Connection to the cache backend failed.
    #[error("cache connection error: {0}")]
    Connection(String),

    /// A backend command timed out.
    #[error("cache operation timed out")]
    Timeout,

    /// Invalid cache configuration (for example, a write without a TTL).
    #[error("cache configuration error: {0}")]
    Configuration(String),

    /// A stored value could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(String),

    /// A caller-supplied key cannot be stored.
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// A key returned by the backend does not have the expected structure.
    #[error("malformed cache key: {0}")]
    MalformedKey(String),

    /// The backend answered with a reply of the wrong shape.
    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply {
        /// Command that produced the reply.
        command: &'static str,
        /// Debug rendering of the reply.
        reply: String,
    },

    /// Internal cache error.
    #[error("internal cache error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
