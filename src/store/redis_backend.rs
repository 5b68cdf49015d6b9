//! Redis-backed store
//!
//! Strings map to Redis strings and queues to Redis lists: elements are
//! appended with RPUSH and taken from the head with LPOP, so a queue is FIFO.
//! All calls go through a [`ConnectionManager`], which multiplexes one
//! connection between concurrent requests and reconnects on failure.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};
use url::Url;

use super::{SetCommand, SetCondition, Store, StoreResult, queue_elements};
use crate::config::StoreConfig;

pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect using host, port, password and database index from the config.
    ///
    /// The initial handshake is bounded by the configured call timeout, so an
    /// unreachable server fails start-up instead of hanging it.
    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        let url = connection_url(config)?;
        info!(
            "Connecting to Redis at {}:{} (db {})",
            config.host, config.port, config.db
        );
        match config.timeout() {
            Some(limit) => tokio::time::timeout(limit, Self::open(url.as_str()))
                .await
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Redis at {}:{} did not answer within {:?}",
                        config.host,
                        config.port,
                        limit
                    )
                })?,
            None => Self::open(url.as_str()).await,
        }
    }

    /// Connect to a `redis://` URL.
    pub async fn open(url: &str) -> anyhow::Result<Self> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }
}

/// `redis://[:password@]host:port/db`
fn connection_url(config: &StoreConfig) -> anyhow::Result<Url> {
    let mut url = Url::parse(&format!(
        "redis://{}:{}/{}",
        config.host, config.port, config.db
    ))?;
    if let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) {
        url.set_password(Some(password))
            .map_err(|_| anyhow::anyhow!("cannot set password on {}", url))?;
    }
    Ok(url)
}

fn set_cmd(cmd: &SetCommand) -> redis::Cmd {
    let mut set = redis::cmd("SET");
    set.arg(&cmd.key).arg(&cmd.value);
    if let Some(ttl) = cmd.expiry {
        set.arg("EX").arg(ttl.as_secs());
    }
    match cmd.condition {
        SetCondition::IfNotExists => {
            set.arg("NX");
        }
        SetCondition::IfExists => {
            set.arg("XX");
        }
        SetCondition::Always => {}
    }
    set
}

#[async_trait]
impl Store for RedisStore {
    async fn set(&self, cmd: &SetCommand) -> StoreResult<bool> {
        let mut conn = self.manager.clone();
        // "OK" when written, nil when NX/XX skipped the write
        let reply: Option<String> = set_cmd(cmd).query_async(&mut conn).await?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn push(&self, key: &str, raw: &str) -> StoreResult<()> {
        let elements = queue_elements(raw);
        if elements.is_empty() {
            debug!("Nothing to push onto '{}'", key);
            return Ok(());
        }

        let mut conn = self.manager.clone();
        let len: i64 = conn.rpush(key, elements).await?;
        debug!("Queue '{}' now holds {} elements", key, len);
        Ok(())
    }

    async fn pop(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.manager.clone();
        let head: Option<String> = conn.lpop(key, None).await?;
        Ok(head)
    }
}
