use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    resp::{RespMessage, RespValue},
    server::RedisServer,
};

pub struct PsyncArguments {
    /// `?` on a first synchronization
    pub master_repl_id: String,
    /// `-1` on a first synchronization
    pub offset: i64,
}

impl PsyncArguments {
    pub fn parse(arguments: &[RespMessage]) -> Result<Self, CommandError> {
        let [master_repl_id, offset] = arguments else {
            return Err(CommandError::InvalidPsyncCommand);
        };

        let master_repl_id = string_argument(master_repl_id)?;
        let offset = string_argument(offset)?
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidPsyncOffset)?;

        Ok(Self {
            master_repl_id,
            offset,
        })
    }
}

/// Handles PSYNC. Partial resynchronization is not supported, so every
/// request is answered with `+FULLRESYNC <replid> <offset>` and the caller
/// must follow up with the snapshot.
pub async fn psync(
    server: Arc<RwLock<RedisServer>>,
    arguments: &[RespMessage],
) -> Result<CommandResult, CommandError> {
    let psync_arguments = PsyncArguments::parse(arguments)?;
    let server_guard = server.read().await;

    info!(
        requested_id = %psync_arguments.master_repl_id,
        requested_offset = psync_arguments.offset,
        "starting full resynchronization"
    );

    Ok(CommandResult::Sync(
        RespValue::SimpleString(format!(
            "FULLRESYNC {} {}",
            server_guard.repl_id, server_guard.repl_offset
        ))
        .encode(),
    ))
}
