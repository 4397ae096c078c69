use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    resp::{RespMessage, RespValue},
    server::RedisServer,
};

pub async fn info(
    server: Arc<RwLock<RedisServer>>,
    arguments: &[RespMessage],
) -> Result<CommandResult, CommandError> {
    // A bare INFO reports the only supported section.
    let section = match arguments {
        [] => "replication".to_string(),
        [section] => string_argument(section)?.to_lowercase(),
        _ => return Err(CommandError::InvalidInfoCommand),
    };

    if section != "replication" {
        return Err(CommandError::InvalidInfoSection);
    }

    let server_guard = server.read().await;
    let report = format!(
        "role:{}master_replid:{}master_repl_offset:{}",
        server_guard.role.as_str(),
        server_guard.repl_id,
        server_guard.repl_offset
    );

    Ok(CommandResult::Response(
        RespValue::BulkString(report).encode(),
    ))
}
