use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use super::{SetCommand, SetCondition, Store, StoreError, StoreResult, queue_elements};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Debug, Clone)]
enum Slot {
    Text(Vec<u8>),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    /// Expiration timestamp in milliseconds (Unix timestamp)
    expires_at: Option<u64>,
}

impl Entry {
    fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(exp) => now_ms >= exp,
            None => false,
        }
    }
}

/// In-memory key-value and queue store
///
/// Follows the Redis semantics the HTTP API relies on: SET replaces a value of
/// any type and resets its TTL, touching a key of the other type is WRONGTYPE,
/// and a queue disappears once its last element is popped. Expired keys are
/// dropped lazily.
pub struct MemoryStore {
    data: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned<T>(_: T) -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn set(&self, cmd: &SetCommand) -> StoreResult<bool> {
        let now = now_ms();
        let mut data = self.data.write().map_err(Self::poisoned)?;

        let exists = data.get(&cmd.key).is_some_and(|e| !e.is_expired(now));
        let allowed = match cmd.condition {
            SetCondition::Always => true,
            SetCondition::IfNotExists => !exists,
            SetCondition::IfExists => exists,
        };
        if !allowed {
            return Ok(false);
        }

        // saturate instead of wrapping for TTLs past the u64 millisecond range
        let expires_at = cmd
            .expiry
            .map(|ttl| now.saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)));
        data.insert(
            cmd.key.clone(),
            Entry {
                slot: Slot::Text(cmd.value.as_bytes().to_vec()),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let data = self.data.read().map_err(Self::poisoned)?;
        match data.get(key) {
            Some(entry) if entry.is_expired(now_ms()) => Ok(None),
            Some(Entry {
                slot: Slot::Text(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    async fn push(&self, key: &str, raw: &str) -> StoreResult<()> {
        let elements = queue_elements(raw);
        if elements.is_empty() {
            return Ok(());
        }

        let now = now_ms();
        let mut data = self.data.write().map_err(Self::poisoned)?;
        if data.get(key).is_some_and(|e| e.is_expired(now)) {
            data.remove(key);
        }

        let entry = data.entry(key.to_string()).or_insert_with(|| Entry {
            slot: Slot::List(VecDeque::new()),
            expires_at: None,
        });
        match &mut entry.slot {
            Slot::List(queue) => {
                queue.extend(elements.into_iter().map(str::to_string));
                Ok(())
            }
            Slot::Text(_) => Err(StoreError::WrongType),
        }
    }

    async fn pop(&self, key: &str) -> StoreResult<Option<String>> {
        let now = now_ms();
        let mut data = self.data.write().map_err(Self::poisoned)?;

        let Some(entry) = data.get_mut(key) else {
            return Ok(None);
        };
        if entry.is_expired(now) {
            data.remove(key);
            return Ok(None);
        }

        let Slot::List(queue) = &mut entry.slot else {
            return Err(StoreError::WrongType);
        };
        let head = queue.pop_front();
        if queue.is_empty() {
            data.remove(key);
        }
        Ok(head)
    }
}
