//! Redis connection configuration.

use std::str::FromStr;
use std::time::Duration;

use kc_cache::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Redis server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Redis password (optional).
    pub password: Option<String>,
    /// Redis database number.
    #[serde(default)]
    pub database: u8,
    /// Use TLS for connection.
    #[serde(default)]
    pub tls: bool,
    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Command timeout in milliseconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
    /// `COUNT` hint sent with every `SCAN` page (server default when unset).
    #[serde(default)]
    pub scan_count: Option<u32>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            database: 0,
            tls: false,
            pool_size: default_pool_size(),
            connect_timeout_ms: default_connect_timeout(),
            command_timeout_ms: default_command_timeout(),
            scan_count: None,
        }
    }
}

impl RedisConfig {
    /// Creates a new Redis configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from `KC_REDIS_*` environment variables.
    ///
    /// A `.env` file is loaded first if present. Unset variables keep their
    /// defaults.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::Configuration` if a variable cannot be parsed.
    pub fn from_env() -> CacheResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CacheResult<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("KC_REDIS_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "KC_REDIS_PORT")? {
            config.port = port;
        }
        if let Some(password) = lookup("KC_REDIS_PASSWORD").filter(|p| !p.is_empty()) {
            config.password = Some(password);
        }
        if let Some(database) = parse_var(&lookup, "KC_REDIS_DATABASE")? {
            config.database = database;
        }
        if let Some(tls) = parse_var(&lookup, "KC_REDIS_TLS")? {
            config.tls = tls;
        }
        if let Some(size) = parse_var(&lookup, "KC_REDIS_POOL_SIZE")? {
            config.pool_size = size;
        }
        if let Some(timeout) = parse_var(&lookup, "KC_REDIS_CONNECT_TIMEOUT_MS")? {
            config.connect_timeout_ms = timeout;
        }
        if let Some(timeout) = parse_var(&lookup, "KC_REDIS_COMMAND_TIMEOUT_MS")? {
            config.command_timeout_ms = timeout;
        }
        config.scan_count = parse_var(&lookup, "KC_REDIS_SCAN_COUNT")?;

        Ok(config)
    }

    /// Sets the Redis host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the Redis port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the Redis password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the Redis database number.
    #[must_use]
    pub const fn database(mut self, database: u8) -> Self {
        self.database = database;
        self
    }

    /// Enables TLS.
    #[must_use]
    pub const fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the connection pool size.
    #[must_use]
    pub const fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Sets the `SCAN` page size hint.
    #[must_use]
    pub const fn scan_count(mut self, count: u32) -> Self {
        self.scan_count = Some(count);
        self
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the command timeout.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Builds the Redis connection URL.
    #[must_use]
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let auth = self
            .password
            .as_ref()
            .map(|p| format!(":{p}@"))
            .unwrap_or_default();
        format!(
            "{scheme}://{auth}{host}:{port}/{db}",
            host = self.host,
            port = self.port,
            db = self.database
        )
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> CacheResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| CacheError::Configuration(format!("invalid {name}: {e}")))
        })
        .transpose()
}

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    6379
}

const fn default_pool_size() -> usize {
    10
}

const fn default_connect_timeout() -> u64 {
    5000
}

const fn default_command_timeout() -> u64 {
    2000
}
