use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{SetCommand, Store, StoreError, StoreResult};

/// Bounds every call of the wrapped store by a fixed duration.
pub struct TimeoutStore<S> {
    inner: S,
    limit: Duration,
}

impl<S: Store> TimeoutStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        op: &str,
        key: &str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} on '{}' timed out after {:?}", op, key, self.limit);
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl<S: Store> Store for TimeoutStore<S> {
    async fn set(&self, cmd: &SetCommand) -> StoreResult<bool> {
        self.bounded("SET", &cmd.key, self.inner.set(cmd)).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.bounded("GET", key, self.inner.get(key)).await
    }

    async fn push(&self, key: &str, raw: &str) -> StoreResult<()> {
        self.bounded("PUSH", key, self.inner.push(key, raw)).await
    }

    async fn pop(&self, key: &str) -> StoreResult<Option<String>> {
        self.bounded("POP", key, self.inner.pop(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    /// A store that never answers
    struct StalledStore;

    #[async_trait]
    impl Store for StalledStore {
        async fn set(&self, _cmd: &SetCommand) -> StoreResult<bool> {
            std::future::pending().await
        }

        async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
            std::future::pending().await
        }

        async fn push(&self, _key: &str, _raw: &str) -> StoreResult<()> {
            std::future::pending().await
        }

        async fn pop(&self, _key: &str) -> StoreResult<Option<String>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_call_times_out() {
        let limit = Duration::from_millis(10);
        let store = TimeoutStore::new(StalledStore, limit);

        assert_eq!(store.get("k").await, Err(StoreError::Timeout(limit)));
        assert_eq!(store.pop("k").await, Err(StoreError::Timeout(limit)));
        assert_eq!(store.push("k", "a").await, Err(StoreError::Timeout(limit)));
        assert_eq!(
            store.set(&SetCommand::new("k", "v")).await,
            Err(StoreError::Timeout(limit))
        );
    }

    #[tokio::test]
    async fn test_passes_results_through() {
        let store = TimeoutStore::new(MemoryStore::new(), Duration::from_secs(1));
        store.push("q", "x y").await.unwrap();
        assert_eq!(store.pop("q").await.unwrap(), Some("x".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }
}
