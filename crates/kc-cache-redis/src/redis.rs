//! Redis store client.
//!
//! Every command goes through a single dispatcher task over an unbounded
//! channel. The dispatcher runs jobs one at a time in the order they were
//! queued, so a read observes every write issued before it, including
//! fire-and-forget batches. Each fire-and-forget batch is sent as one
//! pipeline.

use async_trait::async_trait;
use fred::prelude::*;
use kc_cache::{CacheError, CacheResult};
use tokio::sync::{mpsc, oneshot};

use crate::client::{Command, Reply, StoreClient};
use crate::config::RedisConfig;
use crate::error::{from_redis_error, from_reply_error};

/// Work queued on the dispatcher.
enum Job {
    /// A command whose reply is awaited by the caller.
    Call {
        command: Command,
        reply: oneshot::Sender<CacheResult<Reply>>,
    },
    /// A fire-and-forget batch.
    Batch(Vec<Command>),
}

/// `fred`-backed [`StoreClient`].
#[derive(Clone)]
pub struct RedisClient {
    pool: Pool,
    dispatcher: mpsc::UnboundedSender<Job>,
}

impl RedisClient {
    /// Connects a pool of `pool_size` clients to Redis and starts the
    /// dispatcher task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// ## Errors
    ///
    /// Returns an error if the configuration is invalid or the connection
    /// cannot be established.
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let redis_config = Config::from_url(&config.connection_url())
            .map_err(|e| CacheError::Configuration(e.to_string()))?;

        let performance = PerformanceConfig {
            default_command_timeout: config.command_timeout(),
            ..PerformanceConfig::default()
        };
        let connection = ConnectionConfig {
            connection_timeout: config.connect_timeout(),
            ..ConnectionConfig::default()
        };

        let pool = Builder::from_config(redis_config)
            .set_performance_config(performance)
            .set_connection_config(connection)
            .set_policy(ReconnectPolicy::new_exponential(0, 1000, 30_000, 2))
            .build_pool(config.pool_size)
            .map_err(from_redis_error)?;

        pool.init().await.map_err(from_redis_error)?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            pool_size = config.pool_size,
            "Connected to Redis"
        );

        Ok(Self::from_pool(pool))
    }

    /// Wraps an initialized `fred` pool and starts the dispatcher task.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn from_pool(pool: Pool) -> Self {
        let (dispatcher, queue) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(pool.clone(), queue));
        Self { pool, dispatcher }
    }

    /// Returns the underlying Redis pool.
    #[must_use]
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }

    fn enqueue(&self, job: Job) -> CacheResult<()> {
        self.dispatcher.send(job).map_err(|_| dispatcher_stopped())
    }
}

#[async_trait]
impl StoreClient for RedisClient {
    async fn execute(&self, command: Command) -> CacheResult<Reply> {
        let (reply, response) = oneshot::channel();
        self.enqueue(Job::Call { command, reply })?;
        response.await.map_err(|_| dispatcher_stopped())?
    }

    fn execute_fire_and_forget(&self, commands: Vec<Command>) -> CacheResult<()> {
        if commands.is_empty() {
            return Ok(());
        }
        self.enqueue(Job::Batch(commands))
    }
}

fn dispatcher_stopped() -> CacheError {
    CacheError::Connection("Redis dispatcher has stopped".to_string())
}

async fn dispatch(pool: Pool, mut queue: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = queue.recv().await {
        let client = pool.next();
        match job {
            Job::Call { command, reply } => {
                let name = command.name();
                let result = call(client, command).await;
                if reply.send(result).is_err() {
                    tracing::debug!(command = name, "Caller went away before the reply");
                }
            }
            Job::Batch(commands) => {
                let count = commands.len();
                if let Err(e) = run_pipeline(client, commands).await {
                    tracing::warn!(commands = count, "Fire-and-forget pipeline failed: {}", e);
                }
            }
        }
    }
    tracing::debug!("Redis dispatcher stopped");
}

async fn call(client: &Client, command: Command) -> CacheResult<Reply> {
    let name = command.name();
    let reply = match command {
        Command::Set { key, value, ttl_ms } => {
            client
                .set::<(), _, _>(key, value, Some(px(ttl_ms)), None, false)
                .await
                .map(|()| Reply::Ok)
        }
        Command::Get { key } => client
            .get::<Value, _>(key)
            .await
            .map(|value| Reply::Value(into_bytes(&value))),
        Command::Del { key } => client.del::<(), _>(key).await.map(|()| Reply::Ok),
        Command::MGet { keys } if keys.is_empty() => Ok(Reply::Values(Vec::new())),
        Command::MGet { keys } => client
            .mget::<Vec<Value>, _>(keys)
            .await
            .map(|values| Reply::Values(values.iter().map(into_bytes).collect())),
        Command::Scan {
            cursor,
            pattern,
            count,
        } => client
            .scan_page::<(String, Vec<Key>), _, _>(cursor, pattern, count, None)
            .await
            .map(|(cursor, keys)| Reply::ScanPage {
                cursor,
                keys: keys.into_iter().map(|key| key.into_bytes().to_vec()).collect(),
            }),
    };
    reply.map_err(|e| from_reply_error(name, e))
}

async fn run_pipeline(client: &Client, commands: Vec<Command>) -> Result<(), Error> {
    let pipeline = client.pipeline();
    for command in commands {
        match command {
            Command::Set { key, value, ttl_ms } => {
                pipeline
                    .set::<(), _, _>(key, value, Some(px(ttl_ms)), None, false)
                    .await?;
            }
            Command::Get { key } => pipeline.get::<(), _>(key).await?,
            Command::Del { key } => pipeline.del::<(), _>(key).await?,
            Command::MGet { keys } => pipeline.mget::<(), _>(keys).await?,
            Command::Scan {
                cursor,
                pattern,
                count,
            } => {
                pipeline
                    .scan_page::<(), _, _>(cursor, pattern, count, None)
                    .await?;
            }
        }
    }
    let _: Value = pipeline.all().await?;
    Ok(())
}

fn px(ttl_ms: u64) -> Expiration {
    Expiration::PX(i64::try_from(ttl_ms).unwrap_or(i64::MAX))
}

fn into_bytes(value: &Value) -> Option<Vec<u8>> {
    if value.is_null() {
        None
    } else {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}
