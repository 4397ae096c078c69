use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    resp::{RespMessage, RespValue},
    server::RedisServer,
};

pub async fn config_get(
    server: Arc<RwLock<RedisServer>>,
    arguments: &[RespMessage],
) -> Result<CommandResult, CommandError> {
    let [name] = arguments else {
        return Err(CommandError::InvalidConfigGetCommand);
    };

    let name = string_argument(name)?.to_lowercase();
    let server_guard = server.read().await;

    let value = match name.as_str() {
        "dir" => server_guard.rdb_directory.clone(),
        "dbfilename" => server_guard.rdb_filename.clone(),
        _ => return Err(CommandError::InvalidConfigGetCommandArgument),
    };

    Ok(CommandResult::Response(
        RespValue::Array(vec![RespValue::BulkString(name), RespValue::BulkString(value)]).encode(),
    ))
}
