use std::sync::Arc;

use globset::Glob;
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    rdb::read_snapshot_keys,
    resp::{RespMessage, RespValue},
    server::RedisServer,
};

/// Lists the keys of the configured snapshot file that match a glob pattern.
///
/// A missing or unreadable snapshot yields an empty list.
pub async fn keys(
    server: Arc<RwLock<RedisServer>>,
    arguments: &[RespMessage],
) -> Result<CommandResult, CommandError> {
    let [pattern] = arguments else {
        return Err(CommandError::InvalidKeysCommand);
    };

    let pattern = string_argument(pattern)?;
    let matcher = Glob::new(&pattern)
        .map_err(|_| CommandError::InvalidGlobPattern(pattern.clone()))?
        .compile_matcher();

    let rdb_path = server.read().await.rdb_path();

    let keys = match read_snapshot_keys(&rdb_path).await {
        Ok(keys) => keys,
        Err(e) => {
            warn!(path = %rdb_path.display(), error = %e, "could not read snapshot keys");
            Vec::new()
        }
    };

    let matching_keys = keys
        .into_iter()
        .filter(|key| matcher.is_match(key))
        .map(RespValue::BulkString)
        .collect();

    Ok(CommandResult::Response(
        RespValue::Array(matching_keys).encode(),
    ))
}
