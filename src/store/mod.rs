//! Store client
//!
//! The HTTP layer only talks to the [`Store`] trait. The production backend is
//! Redis ([`RedisStore`]); [`MemoryStore`] keeps everything in process and is
//! what the tests run against. [`TimeoutStore`] bounds every call of whatever
//! it wraps.

pub mod error;
pub mod memory;
pub mod redis_backend;
pub mod timeout;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Backend, StoreConfig};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_backend::RedisStore;
pub use timeout::TimeoutStore;

/// Write condition for SET
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetCondition {
    /// Unconditional write
    #[default]
    Always,
    /// Only write if the key does not exist (NX)
    IfNotExists,
    /// Only write if the key already exists (XX)
    IfExists,
}

impl SetCondition {
    /// Map the form's `condition` field. Anything but "NX"/"XX" is unconditional.
    pub fn from_field(field: &str) -> Self {
        match field {
            "NX" => SetCondition::IfNotExists,
            "XX" => SetCondition::IfExists,
            _ => SetCondition::Always,
        }
    }
}

/// A validated SET request
#[derive(Debug, Clone, PartialEq)]
pub struct SetCommand {
    pub key: String,
    pub value: String,
    /// Time to live; `None` stores the key without expiry
    pub expiry: Option<Duration>,
    pub condition: SetCondition,
}

impl SetCommand {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expiry: None,
            condition: SetCondition::Always,
        }
    }

    /// Expire after `secs` seconds; zero means the key never expires.
    pub fn with_expiry_secs(mut self, secs: u64) -> Self {
        self.expiry = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn with_condition(mut self, condition: SetCondition) -> Self {
        self.condition = condition;
        self
    }
}

/// Key-value and queue operations backing the HTTP API.
#[async_trait]
pub trait Store: Send + Sync {
    /// Write a value. Returns `false` when the condition prevented the write.
    async fn set(&self, cmd: &SetCommand) -> StoreResult<bool>;

    /// Read a value; `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Split `raw` into queue elements and append them to the tail of `key`.
    async fn push(&self, key: &str, raw: &str) -> StoreResult<()>;

    /// Remove the head of the queue at `key`; `Ok(None)` when it is empty.
    async fn pop(&self, key: &str) -> StoreResult<Option<String>>;
}

/// Queue elements carried by a single push value, in order.
pub fn queue_elements(raw: &str) -> Vec<&str> {
    raw.split_whitespace().collect()
}

/// Build the store described by the configuration.
pub async fn connect(config: &StoreConfig) -> anyhow::Result<Arc<dyn Store>> {
    let timeout = config.timeout();

    let store: Arc<dyn Store> = match (config.backend, timeout) {
        (Backend::Redis, Some(limit)) => {
            Arc::new(TimeoutStore::new(RedisStore::connect(config).await?, limit))
        }
        (Backend::Redis, None) => Arc::new(RedisStore::connect(config).await?),
        (Backend::Memory, Some(limit)) => Arc::new(TimeoutStore::new(MemoryStore::new(), limit)),
        (Backend::Memory, None) => Arc::new(MemoryStore::new()),
    };

    info!(
        "Store backend: {:?}, call timeout: {:?}",
        config.backend, timeout
    );
    Ok(store)
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// A store whose every call fails with the same error
    pub struct FailingStore(pub StoreError);

    impl FailingStore {
        pub fn backend(msg: &str) -> Self {
            Self(StoreError::Backend(msg.to_string()))
        }
    }

    #[async_trait]
    impl Store for FailingStore {
        async fn set(&self, _cmd: &SetCommand) -> StoreResult<bool> {
            Err(self.0.clone())
        }

        async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
            Err(self.0.clone())
        }

        async fn push(&self, _key: &str, _raw: &str) -> StoreResult<()> {
            Err(self.0.clone())
        }

        async fn pop(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(self.0.clone())
        }
    }
}
