use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{CommandError, CommandResult, command_handler::string_argument},
    key_value_store::KeyValueStore,
    resp::{RespMessage, RespValue},
};

pub struct GetArguments {
    pub key: String,
}

impl GetArguments {
    pub fn parse(arguments: &[RespMessage]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::InvalidGetCommand);
        };

        Ok(Self {
            key: string_argument(key)?,
        })
    }
}

pub async fn get(
    store: Arc<Mutex<KeyValueStore>>,
    arguments: &[RespMessage],
) -> Result<CommandResult, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let value = store.lock().await.get(&get_arguments.key);

    let response = match value {
        Some(value) => RespValue::BulkString(value),
        None => RespValue::Null,
    };

    Ok(CommandResult::Response(response.encode()))
}
