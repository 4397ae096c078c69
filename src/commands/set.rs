use std::time::Duration;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    key_value_store::{KeyValueStore, StoredValue},
    resp::{RespKind, RespMessage, RespValue},
};

#[derive(Debug, PartialEq)]
pub struct SetArguments {
    pub key: String,
    pub value: StoredValue,
    pub ttl: Option<Duration>,
}

impl SetArguments {
    pub fn parse(arguments: &[RespMessage]) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 4 {
            return Err(CommandError::InvalidSetCommand);
        }

        let key = string_argument(&arguments[0])?;

        let value = match arguments[1].kind() {
            RespKind::BulkString if !arguments[1].is_null() => StoredValue::String(
                string_argument(&arguments[1]).map_err(|_| CommandError::InvalidSetCommandValue)?,
            ),
            RespKind::Integer => StoredValue::Integer(
                arguments[1]
                    .as_integer()
                    .ok_or(CommandError::InvalidSetCommandValue)?,
            ),
            _ => return Err(CommandError::InvalidSetCommandValue),
        };

        let mut ttl = None;

        // Options other than PX are accepted and ignored.
        if arguments.len() == 4 && string_argument(&arguments[2])?.eq_ignore_ascii_case("px") {
            let milliseconds = string_argument(&arguments[3])?
                .parse::<i64>()
                .map_err(|_| CommandError::InvalidSetCommandExpiration)?;

            if milliseconds > 0 {
                ttl = Some(Duration::from_millis(milliseconds as u64));
            }
        }

        Ok(Self { key, value, ttl })
    }
}

/// Applies a SET to an already locked store.
pub fn set(store: &mut KeyValueStore, arguments: &[RespMessage]) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    store.set(set_arguments.key, set_arguments.value, set_arguments.ttl);

    Ok(CommandResult::Response(
        RespValue::SimpleString("OK".to_string()).encode(),
    ))
}
