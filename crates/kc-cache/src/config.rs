//! Per-call cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};
use crate::key::Namespace;

/// Options passed by the caller on every cache operation.
///
/// Deserializes from the caller's option map:
///
/// ```json
/// { "app_namespace": "myapp", "namespace": "credentials", "ttl": 1800000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Application-wide key prefix.
    #[serde(default = "default_app_namespace")]
    pub app_namespace: String,
    /// Cache name within the application.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Time-to-live of written entries, in milliseconds.
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            app_namespace: default_app_namespace(),
            namespace: default_namespace(),
            ttl: None,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration for an application with default cache name and no TTL.
    #[must_use]
    pub fn new(app_namespace: impl Into<String>) -> Self {
        Self {
            app_namespace: app_namespace.into(),
            ..Self::default()
        }
    }

    /// Sets the cache name.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the TTL of written entries.
    ///
    /// Sub-millisecond precision is truncated.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the TTL of written entries in milliseconds.
    #[must_use]
    pub const fn ttl_millis(mut self, millis: u64) -> Self {
        self.ttl = Some(millis);
        self
    }

    /// Builds the key namespace from the current settings.
    #[must_use]
    pub fn key_namespace(&self) -> Namespace {
        Namespace::new(&self.app_namespace, &self.namespace)
    }

    /// Returns the TTL required by write operations.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::Configuration` if no TTL is set or it is zero.
    pub fn require_ttl(&self) -> CacheResult<u64> {
        match self.ttl {
            Some(0) => Err(CacheError::Configuration(
                "`ttl` must be a positive number of milliseconds".to_string(),
            )),
            Some(millis) => Ok(millis),
            None => Err(CacheError::Configuration(
                "`ttl` is required for writes".to_string(),
            )),
        }
    }
}

fn default_app_namespace() -> String {
    "kc".to_string()
}

fn default_namespace() -> String {
    "cache".to_string()
}
