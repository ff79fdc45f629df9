//! Store client adapter.
//!
//! The cache talks to the backend through [`StoreClient`], which has two
//! entry points: [`StoreClient::execute`] waits for the reply, and
//! [`StoreClient::execute_fire_and_forget`] queues commands without observing
//! any reply.

use std::sync::Arc;

use async_trait::async_trait;
use kc_cache::{CacheError, CacheResult};

/// Cursor value that starts a scan and marks its completion.
pub const SCAN_START: &str = "0";

/// A backend command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SET key value PX ttl_ms`
    Set {
        /// Backend key.
        key: String,
        /// Encoded record.
        value: Vec<u8>,
        /// Expiry in milliseconds.
        ttl_ms: u64,
    },
    /// `GET key`
    Get {
        /// Backend key.
        key: String,
    },
    /// `DEL key`
    Del {
        /// Backend key.
        key: String,
    },
    /// `MGET key...`
    MGet {
        /// Backend keys.
        keys: Vec<String>,
    },
    /// `SCAN cursor MATCH pattern [COUNT count]`
    Scan {
        /// Cursor returned by the previous page, or [`SCAN_START`].
        cursor: String,
        /// Glob the keys must match.
        pattern: String,
        /// Page size hint.
        count: Option<u32>,
    },
}

impl Command {
    /// Returns the command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "SET",
            Self::Get { .. } => "GET",
            Self::Del { .. } => "DEL",
            Self::MGet { .. } => "MGET",
            Self::Scan { .. } => "SCAN",
        }
    }
}

/// A backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledgement of a write or delete.
    Ok,
    /// Reply to `GET`.
    Value(Option<Vec<u8>>),
    /// Reply to `MGET`, aligned with the requested keys.
    Values(Vec<Option<Vec<u8>>>),
    /// Reply to `SCAN`.
    ScanPage {
        /// Cursor for the next page; [`SCAN_START`] when the scan is complete.
        cursor: String,
        /// Keys of this page. May be empty or repeat earlier keys.
        keys: Vec<Vec<u8>>,
    },
}

impl Reply {
    /// Unwraps a `GET` reply.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::UnexpectedReply` for any other reply.
    pub fn into_value(self) -> CacheResult<Option<Vec<u8>>> {
        match self {
            Self::Value(value) => Ok(value),
            other => Err(unexpected("GET", &other)),
        }
    }

    /// Unwraps an `MGET` reply.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::UnexpectedReply` for any other reply.
    pub fn into_values(self) -> CacheResult<Vec<Option<Vec<u8>>>> {
        match self {
            Self::Values(values) => Ok(values),
            other => Err(unexpected("MGET", &other)),
        }
    }

    /// Unwraps a `SCAN` reply into the next cursor and the page keys.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::UnexpectedReply` for any other reply.
    pub fn into_scan_page(self) -> CacheResult<(String, Vec<Vec<u8>>)> {
        match self {
            Self::ScanPage { cursor, keys } => Ok((cursor, keys)),
            other => Err(unexpected("SCAN", &other)),
        }
    }
}

fn unexpected(command: &'static str, reply: &Reply) -> CacheError {
    CacheError::UnexpectedReply {
        command,
        reply: format!("{reply:?}"),
    }
}

/// Command execution against the remote store.
///
/// The connection (or pool) behind a client is shared; commands issued through
/// one client are queued in issuance order.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Executes a command and waits for its reply.
    async fn execute(&self, command: Command) -> CacheResult<Reply>;

    /// Queues commands as one pipeline without waiting for any reply.
    ///
    /// Returns once the commands are queued. Failures of the commands
    /// themselves are not reported to the caller.
    fn execute_fire_and_forget(&self, commands: Vec<Command>) -> CacheResult<()>;
}

#[async_trait]
impl<C: StoreClient + ?Sized> StoreClient for Arc<C> {
    async fn execute(&self, command: Command) -> CacheResult<Reply> {
        (**self).execute(command).await
    }

    fn execute_fire_and_forget(&self, commands: Vec<Command>) -> CacheResult<()> {
        (**self).execute_fire_and_forget(commands)
    }
}
