use async_trait::async_trait;
use tracing::{error, info};

use crate::protocol::command::Command;
use crate::protocol::form::FormFields;
use crate::protocol::reply::Reply;
use crate::store::{SetCommand, SetCondition, Store};

/// Build a [`SetCommand`] from form fields.
///
/// `expiry` is whole seconds; absent or empty means no expiry. Anything that is
/// not a non-negative integer is an invalid request.
fn parse(form: &FormFields) -> Result<SetCommand, Reply> {
    let expiry = match form.value("expiry") {
        "" => 0,
        raw => match raw.parse::<i64>() {
            Ok(secs) if secs >= 0 => secs as u64,
            _ => return Err(Reply::InvalidRequest),
        },
    };

    Ok(SetCommand::new(form.value("key"), form.value("value"))
        .with_expiry_secs(expiry)
        .with_condition(SetCondition::from_field(form.value("condition"))))
}

/// SET command executor
pub struct SetCmd;

#[async_trait]
impl Command for SetCmd {
    async fn execute(&self, form: &FormFields, store: &dyn Store) -> Reply {
        let cmd = match parse(form) {
            Ok(cmd) => cmd,
            Err(reply) => {
                info!(
                    "Invalid expiry '{}' for key '{}'",
                    form.value("expiry"),
                    form.value("key")
                );
                return reply;
            }
        };

        info!(
            "SET key '{}' expiry {:?} condition {:?}",
            cmd.key, cmd.expiry, cmd.condition
        );

        match store.set(&cmd).await {
            Ok(true) => Reply::Success,
            Ok(false) => {
                info!("SET on '{}' skipped by condition {:?}", cmd.key, cmd.condition);
                Reply::Success
            }
            Err(e) => {
                error!("SET on '{}' failed: {}", cmd.key, e);
                Reply::TryAgain
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::testing::FailingStore;
    use std::time::Duration;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_parse_defaults() {
        let cmd = parse(&form(&[("key", "k"), ("value", "v")])).unwrap();
        assert_eq!(cmd, SetCommand::new("k", "v"));
    }

    #[test]
    fn test_parse_expiry_and_condition() {
        let cmd = parse(&form(&[
            ("key", "k"),
            ("value", "v"),
            ("expiry", "60"),
            ("condition", "XX"),
        ]))
        .unwrap();
        assert_eq!(cmd.expiry, Some(Duration::from_secs(60)));
        assert_eq!(cmd.condition, SetCondition::IfExists);
    }

    #[test]
    fn test_parse_empty_key_passes_through() {
        let cmd = parse(&form(&[("value", "v")])).unwrap();
        assert_eq!(cmd.key, "");
    }

    #[test]
    fn test_parse_rejects_bad_expiry() {
        for expiry in ["-1", "abc", "1.5", "10s", " 5"] {
            let result = parse(&form(&[("key", "k"), ("value", "v"), ("expiry", expiry)]));
            assert_eq!(result, Err(Reply::InvalidRequest), "expiry {:?}", expiry);
        }
    }

    #[tokio::test]
    async fn test_set_cmd_execute_success() {
        let store = MemoryStore::new();
        let reply = SetCmd
            .execute(&form(&[("key", "key"), ("value", "value")]), &store)
            .await;

        assert_eq!(reply, Reply::Success);
        assert_eq!(store.get("key").await.unwrap(), Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_invalid_expiry_leaves_store_untouched() {
        let store = MemoryStore::new();
        let reply = SetCmd
            .execute(
                &form(&[("key", "key"), ("value", "value"), ("expiry", "-5")]),
                &store,
            )
            .await;

        assert_eq!(reply, Reply::InvalidRequest);
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_condition_skip_is_still_success() {
        let store = MemoryStore::new();
        let reply = SetCmd
            .execute(
                &form(&[("key", "k"), ("value", "v"), ("condition", "XX")]),
                &store,
            )
            .await;

        assert_eq!(reply, Reply::Success);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_failure_is_try_again() {
        let store = FailingStore::backend("connection refused");
        let reply = SetCmd
            .execute(&form(&[("key", "k"), ("value", "v")]), &store)
            .await;
        assert_eq!(reply, Reply::TryAgain);
    }
}
