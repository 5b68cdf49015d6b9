use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::warn;

use crate::protocol::form::FormFields;
use crate::protocol::get::GetCmd;
use crate::protocol::qpop::QPopCmd;
use crate::protocol::qpush::QPushCmd;
use crate::protocol::reply::Reply;
use crate::protocol::set::SetCmd;
use crate::store::Store;

/// A command served under `POST /<name>`
#[async_trait]
pub trait Command: Send + Sync {
    async fn execute(&self, form: &FormFields, store: &dyn Store) -> Reply;
}

/// Registry of commands by name
pub struct CommandFactory {
    commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl CommandFactory {
    /// Registry holding set, get, qpush and qpop
    pub fn init() -> Self {
        let mut commands: BTreeMap<&'static str, Box<dyn Command>> = BTreeMap::new();
        commands.insert("set", Box::new(SetCmd));
        commands.insert("get", Box::new(GetCmd));
        commands.insert("qpush", Box::new(QPushCmd));
        commands.insert("qpop", Box::new(QPopCmd));
        Self { commands }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Run the command registered as `name`
    pub async fn execute(&self, name: &str, form: &FormFields, store: &dyn Store) -> Reply {
        match self.commands.get(name) {
            Some(cmd) => cmd.execute(form, store).await,
            None => {
                warn!("Unknown command '{}'", name);
                Reply::InvalidRequest
            }
        }
    }
}
