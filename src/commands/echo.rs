use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    resp::{RespMessage, RespValue},
};

pub fn echo(arguments: &[RespMessage]) -> Result<CommandResult, CommandError> {
    let [message] = arguments else {
        return Err(CommandError::InvalidEchoCommand);
    };

    let message = string_argument(message).map_err(|_| CommandError::InvalidEchoCommand)?;

    Ok(CommandResult::Response(
        RespValue::BulkString(message).encode(),
    ))
}
