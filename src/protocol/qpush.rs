use async_trait::async_trait;
use tracing::{error, info};

use crate::protocol::command::Command;
use crate::protocol::form::FormFields;
use crate::protocol::reply::Reply;
use crate::store::Store;

/// QPUSH command executor: appends every whitespace-separated word of `value`
pub struct QPushCmd;

#[async_trait]
impl Command for QPushCmd {
    async fn execute(&self, form: &FormFields, store: &dyn Store) -> Reply {
        let key = form.value("key");
        let value = form.value("value");

        match store.push(key, value).await {
            Ok(()) => {
                info!("QPUSH onto '{}': {:?}", key, value);
                Reply::Success
            }
            Err(e) => {
                error!("QPUSH onto '{}' failed: {}", key, e);
                Reply::TryAgain
            }
        }
    }
}
