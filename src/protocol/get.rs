use async_trait::async_trait;
use tracing::{error, info};

use crate::protocol::command::Command;
use crate::protocol::form::FormFields;
use crate::protocol::reply::Reply;
use crate::store::Store;

/// GET command executor
pub struct GetCmd;

#[async_trait]
impl Command for GetCmd {
    async fn execute(&self, form: &FormFields, store: &dyn Store) -> Reply {
        let key = form.value("key");

        match store.get(key).await {
            Ok(Some(value)) => {
                info!("GET '{}' hit", key);
                Reply::Value(String::from_utf8_lossy(&value).into_owned())
            }
            Ok(None) => {
                info!("GET '{}' miss", key);
                Reply::KeyNotFound
            }
            Err(e) => {
                error!("GET on '{}' failed: {}", key, e);
                Reply::TryAgain
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FailingStore;
    use crate::store::{MemoryStore, SetCommand, StoreError};

    fn form(key: &str) -> FormFields {
        FormFields::from_pairs([("key", key)])
    }

    #[tokio::test]
    async fn test_get_cmd_execute() {
        let store = MemoryStore::new();
        store.set(&SetCommand::new("testkey", "testvalue")).await.unwrap();

        let reply = GetCmd.execute(&form("testkey"), &store).await;
        assert_eq!(reply, Reply::Value("testvalue".to_string()));
    }

    #[tokio::test]
    async fn test_get_cmd_execute_not_found() {
        let store = MemoryStore::new();
        let reply = GetCmd.execute(&form("nonexistent"), &store).await;
        assert_eq!(reply, Reply::KeyNotFound);
    }

    #[tokio::test]
    async fn test_get_returns_value_verbatim() {
        let store = MemoryStore::new();
        let value = "  spaced  out\twith \"quotes\" and ünïcode ";
        store.set(&SetCommand::new("k", value)).await.unwrap();

        let reply = GetCmd.execute(&form("k"), &store).await;
        assert_eq!(reply, Reply::Value(value.to_string()));
    }

    #[tokio::test]
    async fn test_get_on_queue_is_try_again() {
        let store = MemoryStore::new();
        store.push("q", "a").await.unwrap();
        assert_eq!(GetCmd.execute(&form("q"), &store).await, Reply::TryAgain);
    }

    #[tokio::test]
    async fn test_store_failure_is_try_again() {
        let store = FailingStore(StoreError::Timeout(std::time::Duration::from_secs(2)));
        assert_eq!(GetCmd.execute(&form("k"), &store).await, Reply::TryAgain);
    }
}
