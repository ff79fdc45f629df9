//! Redis error conversion.

use fred::error::{Error, ErrorKind};
use kc_cache::CacheError;

/// Converts a `fred` Redis error to a `CacheError`.
#[allow(clippy::needless_pass_by_value)]
pub fn from_redis_error(err: Error) -> CacheError {
    match err.kind() {
        ErrorKind::Timeout => CacheError::Timeout,
        ErrorKind::IO | ErrorKind::Canceled => CacheError::Connection(err.to_string()),
        ErrorKind::Config | ErrorKind::Url | ErrorKind::Tls => {
            CacheError::Configuration(err.to_string())
        }
        ErrorKind::Parse => CacheError::UnexpectedReply {
            command: "unknown",
            reply: err.details().to_string(),
        },
        _ => CacheError::Internal(err.to_string()),
    }
}

/// Converts an error returned for `command`, naming the command when the reply
/// could not be parsed.
#[allow(clippy::needless_pass_by_value)]
pub fn from_reply_error(command: &'static str, err: Error) -> CacheError {
    match err.kind() {
        ErrorKind::Parse => CacheError::UnexpectedReply {
            command,
            reply: err.details().to_string(),
        },
        _ => from_redis_error(err),
    }
}
