use async_trait::async_trait;
use tracing::{info, warn};

use crate::protocol::command::Command;
use crate::protocol::form::FormFields;
use crate::protocol::reply::Reply;
use crate::store::Store;

/// QPOP command executor
///
/// Removes exactly one element from the head of the queue. An empty or missing
/// queue yields an empty value rather than an error; store errors are returned
/// to the caller with the store's message.
pub struct QPopCmd;

#[async_trait]
impl Command for QPopCmd {
    async fn execute(&self, form: &FormFields, store: &dyn Store) -> Reply {
        let key = form.value("key");

        match store.pop(key).await {
            Ok(Some(element)) => {
                info!("QPOP from '{}'", key);
                Reply::Value(element)
            }
            Ok(None) => {
                info!("QPOP from '{}': queue empty", key);
                Reply::Value(String::new())
            }
            Err(e) => {
                warn!("QPOP from '{}' failed: {}", key, e);
                Reply::Rejected(e.to_string())
            }
        }
    }
}
