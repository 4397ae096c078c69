use crate::{
    commands::{CommandError, CommandResult},
    resp::{RespMessage, RespValue},
};

pub fn ping(arguments: &[RespMessage]) -> Result<CommandResult, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::InvalidPingCommand);
    }

    Ok(CommandResult::Response(
        RespValue::SimpleString("PONG".to_string()).encode(),
    ))
}
